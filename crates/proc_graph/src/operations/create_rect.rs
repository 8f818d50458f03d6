use glam::Vec3;

use crate::error::{Error, Result};
use crate::objects::{Geometry, ProceduralObject};
use crate::operations::{Job, Operation, ParameterDecl};

/// Emits one rectangle per execution on its `out` interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateRect;

/// In-plane axes for the `plane` parameter.
pub fn plane_axes(plane: &str) -> Result<(Vec3, Vec3)> {
    match plane {
        "x" => Ok((Vec3::Y, Vec3::Z)),
        "y" => Ok((Vec3::X, Vec3::NEG_Z)),
        "z" => Ok((Vec3::X, Vec3::Y)),
        other => Err(Error::InvalidArgument {
            argument: "plane".into(),
            message: format!("expected one of x, y, z but got '{}'", other),
        }),
    }
}

impl Operation for CreateRect {
    fn name(&self) -> &'static str {
        "CreateRect"
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::new("width", "Width", 1.0),
            ParameterDecl::new("height", "Height", 1.0),
            ParameterDecl::new("plane", "Plane", "z"),
        ]
    }

    fn output_interfaces(&self) -> &'static [&'static str] {
        &["out"]
    }

    fn execute(&self, job: &mut Job<'_>) -> Result<()> {
        let width = job.float("width")?;
        let height = job.float("height")?;
        let (x_axis, y_axis) = plane_axes(&job.string("plane")?)?;
        let geometry = Geometry::rect(width, height, x_axis, y_axis);
        job.emit("out", ProceduralObject::with_geometry(geometry))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Parameter;
    use crate::operations::tests::run_operation;
    use crate::value::Value;

    #[test]
    fn emits_a_single_quad() {
        let out = run_operation(
            &CreateRect,
            &[
                ("width", Parameter::value(2.0)),
                ("height", Parameter::value(1.0)),
            ],
            Vec::new(),
        )
        .expect("runs");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "out");
        let geometry = out[0].1.geometry.as_ref().expect("has geometry");
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.face_count(), 1);
    }

    #[test]
    fn plane_selects_axes() {
        let out = run_operation(
            &CreateRect,
            &[("plane", Parameter::value("x"))],
            Vec::new(),
        )
        .expect("runs");
        let geometry = out[0].1.geometry.as_ref().expect("has geometry");
        assert!(geometry.vertices().iter().all(|v| v.x == 0.0));
    }

    #[test]
    fn unknown_plane_is_rejected() {
        let err = run_operation(
            &CreateRect,
            &[("plane", Parameter::Value(Value::from("w")))],
            Vec::new(),
        )
        .expect_err("bad plane");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
