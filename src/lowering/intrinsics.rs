//! Intrinsic name resolution.
//!
//! Maps lower-cased HLSL intrinsic names onto the abstract IR ops. The
//! `tex*` family (tex2D, tex2Dlod, texCUBE, ...) collapses onto a single
//! abstract `Sample`; profile-specific sampling shapes are a back-end
//! concern.

use crate::ir::Op;

/// Abstract op for an intrinsic callee name, or `None` when the
/// intrinsic is not supported by the IR vocabulary.
pub fn intrinsic_op(callee: &str) -> Option<Op> {
    let lower = callee.to_ascii_lowercase();
    if lower.starts_with("tex") {
        return Some(Op::Sample);
    }
    let op = match lower.as_str() {
        "mul" => Op::Mul,
        "dot" => Op::Dot,
        "normalize" => Op::Normalize,
        "saturate" => Op::Saturate,
        "sin" => Op::Sin,
        "cos" => Op::Cos,
        "abs" => Op::Abs,
        "min" => Op::Min,
        "max" => Op::Max,
        "clamp" => Op::Clamp,
        "lerp" => Op::Lerp,
        "pow" => Op::Pow,
        "exp" => Op::Exp,
        "log" => Op::Log,
        "step" => Op::Step,
        "smoothstep" => Op::SmoothStep,
        "reflect" => Op::Reflect,
        "refract" => Op::Refract,
        "atan2" => Op::Atan2,
        "fma" => Op::Fma,
        "ddx" => Op::Ddx,
        "ddy" => Op::Ddy,
        "length" => Op::Length,
        "rsqrt" => Op::Rsqrt,
        "rcp" => Op::Rcp,
        "sample" => Op::Sample,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_intrinsics() {
        assert_eq!(intrinsic_op("dot"), Some(Op::Dot));
        assert_eq!(intrinsic_op("smoothstep"), Some(Op::SmoothStep));
        assert_eq!(intrinsic_op("mul"), Some(Op::Mul));
    }

    #[test]
    fn tex_family_collapses_to_sample() {
        assert_eq!(intrinsic_op("tex2D"), Some(Op::Sample));
        assert_eq!(intrinsic_op("TEXCUBE"), Some(Op::Sample));
        assert_eq!(intrinsic_op("tex2Dlod"), Some(Op::Sample));
        assert_eq!(intrinsic_op("sample"), Some(Op::Sample));
    }

    #[test]
    fn unknown_intrinsics_are_rejected() {
        assert_eq!(intrinsic_op("sincos"), None);
        assert_eq!(intrinsic_op("frobnicate"), None);
    }
}
