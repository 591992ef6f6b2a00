use glam::Vec3;
use weave_common::{Transform, math};
use weave_kernel::{Agent, AgentId, ConfigError, PopulationSummary, SimError, SimParams, StepReport, World};
use weave_render::{Frame, Light, Material, MaterialLibrary};
use weave_scene::{Camera, MaterialHandle, MeshHandle, NodeId, Renderable, SceneError, SceneGraph};

use crate::clock::FixedStep;

/// Speeds below this leave the heading unchanged.
const HEADING_MIN_SPEED: f32 = 1e-4;

#[derive(Debug, thiserror::Error)]
pub enum CrowdError {
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Binding between one agent and its scene nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedestrian {
    pub agent: AgentId,
    /// Parent node carrying position and heading.
    pub node: NodeId,
    /// One child per mesh, carrying the renderable.
    pub meshes: Vec<NodeId>,
}

/// Simulation world, scene and materials for a crowd of pedestrians.
#[derive(Debug, Clone)]
pub struct Crowd {
    world: World,
    graph: SceneGraph,
    materials: MaterialLibrary,
    infected_material: MaterialHandle,
    pedestrians: Vec<Pedestrian>,
}

impl Default for Crowd {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl Crowd {
    pub fn new(params: SimParams) -> Self {
        Self::from_world(World::new(params))
    }

    /// Wrap an existing world. Agents already in it get no scene nodes.
    pub fn from_world(world: World) -> Self {
        let mut materials = MaterialLibrary::new();
        let infected_material = materials.insert(Material::infected());
        Self {
            world,
            graph: SceneGraph::new(),
            materials,
            infected_material,
            pedestrians: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access. Changes show up in the scene after the next
    /// [`tick`](Self::tick) or [`sync`](Self::sync).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    pub fn infected_material(&self) -> MaterialHandle {
        self.infected_material
    }

    pub fn pedestrians(&self) -> &[Pedestrian] {
        &self.pedestrians
    }

    pub fn len(&self) -> usize {
        self.pedestrians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pedestrians.is_empty()
    }

    pub fn summary(&self) -> PopulationSummary {
        self.world.summary()
    }

    /// Spawn an agent plus its nodes: `pedestrian_{n}` under the root and a
    /// `submesh_{i}` child per `(mesh, material)` pair.
    pub fn add_pedestrian(
        &mut self,
        agent: Agent,
        meshes: &[(MeshHandle, MaterialHandle)],
    ) -> Result<AgentId, CrowdError> {
        let n = self.pedestrians.len();
        let agent = self.world.spawn(agent);
        let node = self.graph.spawn(format!("pedestrian_{n}"), Transform::default());
        let mut children = Vec::with_capacity(meshes.len());
        for (i, &(mesh, material)) in meshes.iter().enumerate() {
            let child = self
                .graph
                .spawn_child(node, format!("submesh_{i}"), Transform::default())?;
            self.graph
                .set_renderable(child, Some(Renderable::new(mesh, material)))?;
            children.push(child);
        }
        let pedestrian = Pedestrian {
            agent,
            node,
            meshes: children,
        };
        self.sync_one(&pedestrian)?;
        self.graph.recompute_world(node, true)?;
        tracing::debug!(?agent, ?node, meshes = meshes.len(), "pedestrian added");
        self.pedestrians.push(pedestrian);
        Ok(agent)
    }

    /// Step the world by `dt`, mirror agents into the scene and flush it.
    pub fn tick(&mut self, dt: f32) -> Result<StepReport, CrowdError> {
        let report = self.world.step(dt)?;
        self.sync()?;
        Ok(report)
    }

    /// Run however many fixed ticks `clock` releases for `elapsed` seconds.
    pub fn advance(&mut self, clock: &mut FixedStep, elapsed: f32) -> Result<u32, CrowdError> {
        let ticks = clock.advance(elapsed);
        for _ in 0..ticks {
            self.tick(clock.step())?;
        }
        Ok(ticks)
    }

    /// Mirror every agent into its nodes and recompute dirty world matrices.
    pub fn sync(&mut self) -> Result<(), CrowdError> {
        for pedestrian in &self.pedestrians {
            Self::mirror(
                &self.world,
                &mut self.graph,
                self.infected_material,
                pedestrian,
            )?;
        }
        self.graph.flush_dirty();
        Ok(())
    }

    fn sync_one(&mut self, pedestrian: &Pedestrian) -> Result<(), CrowdError> {
        Self::mirror(
            &self.world,
            &mut self.graph,
            self.infected_material,
            pedestrian,
        )
    }

    fn mirror(
        world: &World,
        graph: &mut SceneGraph,
        infected_material: MaterialHandle,
        pedestrian: &Pedestrian,
    ) -> Result<(), CrowdError> {
        let agent = world
            .get(pedestrian.agent)
            .ok_or(SimError::AgentNotFound(pedestrian.agent))?;
        graph.set_position(pedestrian.node, agent.position)?;
        if agent.velocity.length() > HEADING_MIN_SPEED {
            if let Some(rotation) = math::look_rotation(agent.velocity) {
                graph.set_rotation(pedestrian.node, rotation)?;
            }
        }

        let infected = agent.is_infected(world.params().infected_threshold);
        let material_override = infected.then_some(infected_material);
        for &child in &pedestrian.meshes {
            if let Some(renderable) = graph.renderable_mut(child) {
                renderable.material_override = material_override;
            }
        }
        Ok(())
    }

    /// Collect a frame of the current scene.
    pub fn frame(&self, camera: &Camera, lights: &[Light]) -> Result<Frame, CrowdError> {
        Ok(Frame::collect(&self.graph, camera, lights)?)
    }

    /// World position of a pedestrian's node.
    pub fn node_position(&self, pedestrian: &Pedestrian) -> Option<Vec3> {
        self.graph.global_position(pedestrian.node)
    }
}
