//! Built-in effect manifests.

use crate::{
    foundation::ids::{EffectId, ShaderId},
    registry::capability::ManifestRegistry,
    registry::manifest::{
        DEFAULT_OUTPUT, DEFAULT_PRIMARY_PORT, EffectStage, Manifest, ParamDecl, PassDecl,
        PassInput, PassSource, PortDecl, PortRole,
    },
    timeline::model::{COLOR_GRADE_EFFECT_ID, ParamValue, RETIME_EFFECT_ID},
};

/// Two-pass separable blur with a `radius` parameter.
pub const GAUSSIAN_BLUR_EFFECT_ID: &str = "mv.gaussian_blur";
/// Blur masked to frame-context regions; the mask port is conditioned on geometry.
pub const FACE_BLUR_EFFECT_ID: &str = "mv.face_blur";

/// Generator shader that rasterizes frame-context rectangles into a mask.
pub const REGION_MASK_GENERATOR: &str = "gen.region_mask";

/// Registry holding every built-in manifest.
pub fn standard_registry() -> ManifestRegistry {
    let mut reg = ManifestRegistry::new();
    for m in standard_manifests() {
        reg.insert_trusted(m);
    }
    reg
}

/// The built-in manifests, in registration order.
pub fn standard_manifests() -> Vec<Manifest> {
    vec![color_grade(), retime(), gaussian_blur(), face_blur()]
}

fn param(name: &str, default: impl Into<ParamValue>) -> ParamDecl {
    ParamDecl {
        name: name.to_owned(),
        default: default.into(),
    }
}

fn from_effect(port: &str) -> PassSource {
    PassSource::Effect(port.to_owned())
}

fn from_pass(pass: &str) -> PassSource {
    PassSource::Pass {
        pass: pass.to_owned(),
        output: DEFAULT_OUTPUT.to_owned(),
    }
}

fn pass(name: &str, kernel: &str, inputs: &[(&str, PassSource)], params: &[&str]) -> PassDecl {
    PassDecl {
        name: name.to_owned(),
        kernel: ShaderId::new(kernel),
        inputs: inputs
            .iter()
            .map(|(port, from)| PassInput {
                port: (*port).to_owned(),
                from: from.clone(),
            })
            .collect(),
        outputs: vec![DEFAULT_OUTPUT.to_owned()],
        params: params.iter().map(|p| (*p).to_owned()).collect(),
    }
}

fn color_grade() -> Manifest {
    let mut m = Manifest::single_pass(COLOR_GRADE_EFFECT_ID, "fx.color_grade");
    m.params = vec![
        param("lift", 0.0),
        param("gamma", 1.0),
        param("gain", 1.0),
        param("contrast", 1.0),
        param("saturation", 1.0),
        param("region", "all"),
    ];
    m
}

fn retime() -> Manifest {
    let mut m = Manifest::single_pass(RETIME_EFFECT_ID, "fx.retime");
    m.stage = EffectStage::Temporal;
    m.params = vec![param("factor", 1.0)];
    m
}

fn gaussian_blur() -> Manifest {
    let mut m = Manifest::single_pass(EffectId::new(GAUSSIAN_BLUR_EFFECT_ID), "fx.gaussian_blur");
    m.params = vec![param("radius", 8.0)];
    m.passes = vec![
        pass(
            "blur_h",
            "fx.blur_h",
            &[("src", from_effect(DEFAULT_PRIMARY_PORT))],
            &["radius"],
        ),
        pass("blur_v", "fx.blur_v", &[("src", from_pass("blur_h"))], &["radius"]),
    ];
    m
}

fn face_blur() -> Manifest {
    let mut m = Manifest::single_pass(EffectId::new(FACE_BLUR_EFFECT_ID), "fx.face_blur");
    m.ports.push(PortDecl {
        name: "mask".to_owned(),
        role: PortRole::Conditioned {
            generator: ShaderId::new(REGION_MASK_GENERATOR),
        },
    });
    m.params = vec![param("radius", 16.0), param("feather", 0.02)];
    m.passes = vec![
        pass(
            "blur_h",
            "fx.blur_h",
            &[("src", from_effect(DEFAULT_PRIMARY_PORT))],
            &["radius"],
        ),
        pass("blur_v", "fx.blur_v", &[("src", from_pass("blur_h"))], &["radius"]),
        pass(
            "mix",
            "fx.mask_mix",
            &[
                ("src", from_effect(DEFAULT_PRIMARY_PORT)),
                ("blurred", from_pass("blur_v")),
                ("mask", from_effect("mask")),
            ],
            &["feather"],
        ),
    ];
    m
}

#[cfg(test)]
#[path = "../../tests/unit/registry/standard.rs"]
mod tests;
