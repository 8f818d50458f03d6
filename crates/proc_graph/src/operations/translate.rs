use glam::{Mat4, Vec3};

use crate::error::Result;
use crate::operations::{Job, Operation, ParameterDecl};

/// Moves every object from `in` to `out`, offsetting its geometry.
#[derive(Debug, Default, Clone, Copy)]
pub struct Translate;

impl Operation for Translate {
    fn name(&self) -> &'static str {
        "Translate"
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::new("x", "X", 0.0),
            ParameterDecl::new("y", "Y", 0.0),
            ParameterDecl::new("z", "Z", 0.0),
        ]
    }

    fn input_interfaces(&self) -> &'static [&'static str] {
        &["in"]
    }

    fn output_interfaces(&self) -> &'static [&'static str] {
        &["out"]
    }

    fn execute(&self, job: &mut Job<'_>) -> Result<()> {
        while let Some(mut object) = job.next_input("in") {
            let offset = Vec3::new(job.float("x")?, job.float("y")?, job.float("z")?);
            if let Some(geometry) = object.geometry.as_mut() {
                geometry.transform(&Mat4::from_translation(offset));
            }
            job.emit("out", object)?;
        }
        Ok(())
    }
}
