//! Surface triangulation through an external program.

use super::command::CommandSpec;
use super::error::Error;
use super::scratch::Scratch;
use crate::io;
use crate::mesh::Mesh;
use crate::model::structure::Structure;
use std::fs::File;
use std::io::BufWriter;

const TOOL: &str = "mesh generator";

/// Parameters forwarded to the triangulation program.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshParameters {
    pub surface_type: String,
    pub skin_parameter: f64,
    pub grid_scale: f64,
}

impl Default for MeshParameters {
    fn default() -> Self {
        Self {
            surface_type: "skin".to_string(),
            skin_parameter: 0.45,
            grid_scale: 2.0,
        }
    }
}

/// Produces a surface mesh for a cleaned structure.
pub trait MeshGenerator: Send + Sync {
    fn generate(
        &self,
        structure: &Structure,
        params: &MeshParameters,
        scratch: &Scratch,
    ) -> Result<Mesh, Error>;
}

/// Runs a configured triangulation program.
///
/// The program receives an XYZR sphere file and must write an OFF mesh. Arguments may use the
/// placeholders `{input}`, `{output}`, `{output_prefix}` (the output path without `.off`),
/// `{surface_type}`, `{skin_parameter}`, and `{grid_scale}`.
#[derive(Debug, Clone)]
pub struct CommandMeshGenerator {
    command: CommandSpec,
}

impl CommandMeshGenerator {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl MeshGenerator for CommandMeshGenerator {
    fn generate(
        &self,
        structure: &Structure,
        params: &MeshParameters,
        scratch: &Scratch,
    ) -> Result<Mesh, Error> {
        let input = scratch.file(".xyzr");
        let prefix = scratch.file("_mesh");
        let output = scratch.file("_mesh.off");

        let file = File::create(&input).map_err(|e| io::Error::from_io(e, Some(input.clone())))?;
        io::write_xyzr(BufWriter::new(file), structure).map_err(|e| e.with_path(&input))?;

        let vars = [
            ("input", input.display().to_string()),
            ("output", output.display().to_string()),
            ("output_prefix", prefix.display().to_string()),
            ("surface_type", params.surface_type.clone()),
            ("skin_parameter", params.skin_parameter.to_string()),
            ("grid_scale", params.grid_scale.to_string()),
        ];
        self.command.run(TOOL, &vars, scratch.path())?;

        if !output.exists() {
            return Err(Error::missing_output(TOOL, output));
        }
        let mesh = Mesh::load_off(&output)?;
        log::debug!(
            "generated mesh for '{}': {} vertices, {} faces",
            scratch.id(),
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Ok(mesh)
    }
}
