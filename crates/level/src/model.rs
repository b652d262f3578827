use serde::{Deserialize, Serialize};

/// Grid cell size assumed when a layer does not declare one.
pub const DEFAULT_GRID_SIZE: u32 = 32;

/// Identifier of the collision layer in authored levels.
pub const SOLID_LAYER: &str = "Solid";
/// Identifier of the entity layer in authored levels.
pub const ENTITIES_LAYER: &str = "Entities";

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

/// One authored sub-level of the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLevel {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub iid: String,
    /// Explicit world placement. When absent, sub-levels are laid out left
    /// to right in document order.
    #[serde(default)]
    pub world_x: Option<i64>,
    #[serde(default)]
    pub world_y: i64,
    pub px_wid: i64,
    pub px_hei: i64,
    #[serde(default)]
    pub layer_instances: Vec<LayerInstance>,
}

impl SubLevel {
    pub fn new(identifier: impl Into<String>, px_wid: i64, px_hei: i64) -> Self {
        Self {
            identifier: identifier.into(),
            iid: String::new(),
            world_x: None,
            world_y: 0,
            px_wid,
            px_hei,
            layer_instances: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: LayerInstance) -> Self {
        self.layer_instances.push(layer);
        self
    }

    /// The collision layer: identified as `Solid`, or the first IntGrid layer.
    pub fn solid_layer(&self) -> Option<&LayerInstance> {
        self.layer_instances
            .iter()
            .find(|l| l.identifier == SOLID_LAYER)
            .or_else(|| {
                self.layer_instances
                    .iter()
                    .find(|l| l.layer_type == LayerType::IntGrid)
            })
    }

    /// The entity layer: identified as `Entities`, or the first Entities-typed layer.
    pub fn entity_layer(&self) -> Option<&LayerInstance> {
        self.layer_instances
            .iter()
            .find(|l| l.identifier == ENTITIES_LAYER)
            .or_else(|| {
                self.layer_instances
                    .iter()
                    .find(|l| l.layer_type == LayerType::Entities)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    IntGrid,
    Entities,
    Tiles,
    AutoLayer,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerInstance {
    #[serde(rename = "__identifier")]
    pub identifier: String,
    #[serde(rename = "__type")]
    pub layer_type: LayerType,
    #[serde(rename = "__cWid", default)]
    pub c_wid: usize,
    #[serde(rename = "__cHei", default)]
    pub c_hei: usize,
    #[serde(rename = "__gridSize", default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(rename = "intGridCsv", default)]
    pub int_grid_csv: Vec<i32>,
    #[serde(rename = "autoLayerTiles", default)]
    pub auto_layer_tiles: Vec<AutoTile>,
    #[serde(rename = "entityInstances", default)]
    pub entity_instances: Vec<EntityDef>,
}

impl LayerInstance {
    /// An IntGrid layer with row-major cell codes.
    pub fn int_grid(
        identifier: impl Into<String>,
        c_wid: usize,
        c_hei: usize,
        grid_size: u32,
        int_grid_csv: Vec<i32>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            layer_type: LayerType::IntGrid,
            c_wid,
            c_hei,
            grid_size,
            int_grid_csv,
            auto_layer_tiles: Vec::new(),
            entity_instances: Vec::new(),
        }
    }

    pub fn entities(identifier: impl Into<String>, entity_instances: Vec<EntityDef>) -> Self {
        Self {
            identifier: identifier.into(),
            layer_type: LayerType::Entities,
            c_wid: 0,
            c_hei: 0,
            grid_size: DEFAULT_GRID_SIZE,
            int_grid_csv: Vec::new(),
            auto_layer_tiles: Vec::new(),
            entity_instances,
        }
    }

    pub fn with_auto_tiles(mut self, tiles: Vec<AutoTile>) -> Self {
        self.auto_layer_tiles = tiles;
        self
    }

    /// Cell code at grid position, or 0 for out-of-range cells and short CSVs.
    pub fn cell(&self, x: usize, y: usize) -> i32 {
        if x >= self.c_wid || y >= self.c_hei {
            return 0;
        }
        self.int_grid_csv
            .get(y * self.c_wid + x)
            .copied()
            .unwrap_or(0)
    }
}

/// An explicit auto-layer tile placement in sub-level pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoTile {
    pub px: [i64; 2],
    pub t: u32,
}

/// An authored entity instance in sub-level pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    #[serde(rename = "__identifier")]
    pub identifier: String,
    #[serde(default)]
    pub iid: String,
    pub px: [f32; 2],
    #[serde(rename = "fieldInstances", default)]
    pub field_instances: Vec<FieldInstance>,
}

impl EntityDef {
    pub fn new(identifier: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            identifier: identifier.into(),
            iid: String::new(),
            px: [x, y],
            field_instances: Vec::new(),
        }
    }

    pub fn with_field(mut self, identifier: impl Into<String>, value: serde_json::Value) -> Self {
        self.field_instances.push(FieldInstance {
            identifier: identifier.into(),
            value,
        });
        self
    }
}

/// A named custom field attached to an entity definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInstance {
    #[serde(rename = "__identifier")]
    pub identifier: String,
    #[serde(rename = "__value", default)]
    pub value: serde_json::Value,
}
