use glam::Vec3;

use crate::error::Result;
use crate::objects::{Geometry, ProceduralObject};
use crate::operations::{Job, Operation, ParameterDecl};

/// Emits one axis-aligned box per execution on its `out` interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateBox;

impl Operation for CreateBox {
    fn name(&self) -> &'static str {
        "CreateBox"
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::new("xSize", "X Size", 1.0),
            ParameterDecl::new("ySize", "Y Size", 1.0),
            ParameterDecl::new("zSize", "Z Size", 1.0),
        ]
    }

    fn output_interfaces(&self) -> &'static [&'static str] {
        &["out"]
    }

    fn execute(&self, job: &mut Job<'_>) -> Result<()> {
        let size = Vec3::new(job.float("xSize")?, job.float("ySize")?, job.float("zSize")?);
        job.emit("out", ProceduralObject::with_geometry(Geometry::cuboid(size)))?;
        Ok(())
    }
}
