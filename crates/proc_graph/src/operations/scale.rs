use std::str::FromStr;

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::objects::Geometry;
use crate::operations::{Job, Operation, ParameterDecl};

/// Point a [`Scale`] is applied around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotalPoint {
    /// Center of the object's bounds.
    ScopeCenter,
    /// Minimum corner of the object's bounds.
    ScopeOrigin,
    WorldOrigin,
}

impl PivotalPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            PivotalPoint::ScopeCenter => "scope_center",
            PivotalPoint::ScopeOrigin => "scope_origin",
            PivotalPoint::WorldOrigin => "world_origin",
        }
    }

    fn locate(self, geometry: &Geometry) -> Vec3 {
        match self {
            PivotalPoint::ScopeCenter => geometry.center().unwrap_or(Vec3::ZERO),
            PivotalPoint::ScopeOrigin => geometry.bounds().map_or(Vec3::ZERO, |(lo, _)| lo),
            PivotalPoint::WorldOrigin => Vec3::ZERO,
        }
    }
}

impl FromStr for PivotalPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scope_center" => Ok(PivotalPoint::ScopeCenter),
            "scope_origin" => Ok(PivotalPoint::ScopeOrigin),
            "world_origin" => Ok(PivotalPoint::WorldOrigin),
            other => Err(Error::InvalidArgument {
                argument: "pivotal_point".into(),
                message: format!(
                    "expected scope_center, scope_origin or world_origin but got '{}'",
                    other
                ),
            }),
        }
    }
}

/// Scales every object from `in` to `out` around a pivotal point.
#[derive(Debug, Default, Clone, Copy)]
pub struct Scale;

impl Operation for Scale {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn parameters(&self) -> Vec<ParameterDecl> {
        vec![
            ParameterDecl::new("x", "X", 1.0),
            ParameterDecl::new("y", "Y", 1.0),
            ParameterDecl::new("z", "Z", 1.0),
            ParameterDecl::new(
                "pivotal_point",
                "Pivotal Point",
                PivotalPoint::ScopeCenter.as_str(),
            ),
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
            let factors = Vec3::new(job.float("x")?, job.float("y")?, job.float("z")?);
            let pivot: PivotalPoint = job.string("pivotal_point")?.parse()?;
            if let Some(geometry) = object.geometry.as_mut() {
                let p = pivot.locate(geometry);
                let matrix = Mat4::from_translation(p)
                    * Mat4::from_scale(factors)
                    * Mat4::from_translation(-p);
                geometry.transform(&matrix);
            }
            job.emit("out", object)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Parameter;
    use crate::objects::ProceduralObject;
    use crate::operations::tests::run_operation;

    fn offset_box() -> ProceduralObject {
        let mut geometry = Geometry::cuboid(Vec3::ONE);
        geometry.transform(&Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        ProceduralObject::with_geometry(geometry)
    }

    fn scaled(pivot: &str) -> Geometry {
        let out = run_operation(
            &Scale,
            &[
                ("x", Parameter::value(2.0)),
                ("pivotal_point", Parameter::value(pivot)),
            ],
            vec![offset_box()],
        )
        .expect("runs");
        out.into_iter()
            .next()
            .and_then(|(_, o)| o.geometry)
            .expect("one object with geometry")
    }

    #[test]
    fn scope_center_keeps_the_center() {
        let g = scaled("scope_center");
        let center = g.center().expect("non-empty");
        assert!((center - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        let (lo, hi) = g.bounds().expect("non-empty");
        assert!(((hi - lo).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn scope_origin_keeps_the_min_corner() {
        let g = scaled("scope_origin");
        let (lo, _) = g.bounds().expect("non-empty");
        assert!((lo - Vec3::new(1.5, -0.5, -0.5)).length() < 1e-5);
    }

    #[test]
    fn world_origin_scales_positions() {
        let g = scaled("world_origin");
        let center = g.center().expect("non-empty");
        assert!((center - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn unknown_pivot_is_rejected() {
        let err = run_operation(
            &Scale,
            &[("pivotal_point", Parameter::value("elsewhere"))],
            vec![offset_box()],
        )
        .expect_err("bad pivot");
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
