//! Regeneration entry points.
//!
//! Generators own their last output and replace it wholesale on every
//! successful [`regenerate`](WorldGenerator::regenerate). A failed pass leaves
//! the previous output in place; nothing partially built is ever exposed.

use glam::Vec3;
use serde::Serialize;
use tracing::{debug, instrument};
use wrldgen_core::{
    GenerationResult, GeneratorConfig, LandscapeSettings, Placement, TerrainSettings, UvReference,
};
use wrldgen_world::{
    landscape_height, HeightSampler, LayerTerrain, MarkerInstance, StackModel, WorldDocument,
    WorldParser,
};

use crate::mesh::{GridMesh, GridMeshBuilder};

/// Vertical lift applied to the WRLD terrain holder so it sits just above the stage.
const TERRAIN_LIFT: f32 = 0.01;

/// Offset multiplier from the generator origin to the terrain holder.
const TERRAIN_ORIGIN_SPREAD: f32 = 1.5;

/// Landscape mesh lifted from a grayscale height image.
#[derive(Debug, Clone)]
pub struct LandscapeGenerator {
    settings: LandscapeSettings,
    uv: UvReference,
    mesh: Option<GridMesh>,
}

impl LandscapeGenerator {
    /// Generator for the landscape section of `config`.
    pub fn new(config: &GeneratorConfig) -> GenerationResult<Self> {
        config.validate()?;
        Ok(Self {
            settings: config.landscape.clone(),
            uv: config.uv,
            mesh: None,
        })
    }

    /// Rebuild the mesh from `sampler` (flat when the sampler has no source).
    #[instrument(skip_all, fields(width = self.settings.width, depth = self.settings.depth, flat = sampler.is_flat()))]
    pub fn regenerate(&mut self, sampler: &HeightSampler<'_>) -> GenerationResult<&GridMesh> {
        debug!("Starting landscape generation");
        let builder = GridMeshBuilder::new(self.settings.width, self.settings.depth, self.uv)?;
        let max_height = self.settings.max_height;
        let mesh = builder.build(|x, z| landscape_height(sampler, max_height, x, z));
        debug!(hash = %mesh.hash.to_hex(), "Landscape generation complete");
        Ok(self.mesh.insert(mesh))
    }

    /// Last generated mesh.
    pub fn mesh(&self) -> Option<&GridMesh> {
        self.mesh.as_ref()
    }

    /// Transform that scales the mesh and centers it on the holder's origin.
    pub fn placement(&self) -> Placement {
        let scale = self.settings.scale;
        Placement {
            scale: Vec3::splat(scale),
            position: Vec3::new(
                self.settings.width as f32 * -0.5 * scale,
                0.0,
                self.settings.depth as f32 * -0.5 * scale,
            ),
        }
    }

    /// Drop the generated mesh.
    pub fn clear(&mut self) {
        self.mesh = None;
    }
}

/// Everything generated from one WRLD document.
#[derive(Debug, Clone, Serialize)]
pub struct WorldScene {
    /// Informational world name.
    pub world_name: Option<String>,
    /// Parsed layers.
    #[serde(skip)]
    pub model: StackModel,
    /// Terrain mesh built from layer 0.
    pub terrain: GridMesh,
    /// Transform of the terrain holder.
    pub terrain_placement: Placement,
    /// One marker per cell per layer.
    pub markers: Vec<MarkerInstance>,
}

impl WorldScene {
    /// Markers that stand above the floor.
    pub fn standing_markers(&self) -> impl Iterator<Item = &MarkerInstance> {
        self.markers.iter().filter(|m| !m.floored)
    }
}

/// Terrain mesh plus stacked structure markers from WRLD text.
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    config: GeneratorConfig,
    parser: WorldParser,
    scene: Option<WorldScene>,
}

impl WorldGenerator {
    /// Generator using `config`, rejected up front when invalid.
    pub fn new(config: GeneratorConfig) -> GenerationResult<Self> {
        config.validate()?;
        let parser = WorldParser::new(config.parser);
        Ok(Self {
            config,
            parser,
            scene: None,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse `text` and rebuild the terrain and markers.
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn regenerate(&mut self, text: &str) -> GenerationResult<&WorldScene> {
        let document = self.parser.parse(text)?;
        self.regenerate_document(&document)
    }

    /// Rebuild the terrain and markers from an already parsed document.
    pub fn regenerate_document(&mut self, document: &WorldDocument) -> GenerationResult<&WorldScene> {
        debug!(
            grid_x = document.grid_x,
            grid_y = document.grid_y,
            layers = document.layers.len(),
            "Starting world generation"
        );
        let model = document.to_stack_model()?;
        let terrain = build_terrain(&model, &self.config.terrain, self.config.uv)?;
        let markers = model.markers(&self.config.structures)?;

        let scene = WorldScene {
            world_name: document.world_name.clone(),
            terrain_placement: terrain_placement(&self.config.terrain),
            model,
            terrain,
            markers,
        };
        debug!(
            markers = scene.markers.len(),
            hash = %scene.terrain.hash.to_hex(),
            "World generation complete"
        );
        Ok(self.scene.insert(scene))
    }

    /// Last generated scene.
    pub fn scene(&self) -> Option<&WorldScene> {
        self.scene.as_ref()
    }

    /// Drop the terrain and every marker.
    pub fn clear(&mut self) {
        self.scene = None;
    }
}

/// Terrain mesh over layer 0 of `model`.
pub fn build_terrain(
    model: &StackModel,
    settings: &TerrainSettings,
    uv: UvReference,
) -> GenerationResult<GridMesh> {
    let terrain = LayerTerrain::new(model, 0, settings)?;
    let builder = GridMeshBuilder::new(terrain.width(), terrain.depth(), uv)?;
    Ok(builder.build(|x, z| terrain.height_at(x, z)))
}

fn terrain_placement(settings: &TerrainSettings) -> Placement {
    Placement {
        scale: Vec3::splat(settings.scale),
        position: Vec3::new(
            settings.origin.x * TERRAIN_ORIGIN_SPREAD,
            TERRAIN_LIFT,
            settings.origin.z * TERRAIN_ORIGIN_SPREAD,
        ),
    }
}
