//! Color temperature correction and saturation.
//!
//! The correction is a Bradford chromatic adaptation in linear sRGB from
//! the illuminant the scene was lit by (`target - correction` kelvin) to the
//! target white. White points come from the Kim et al. cubic approximation
//! of the Planckian locus.

use super::buffer::LinearFrame;
use super::transfer::luminance;

type Mat3 = [[f64; 3]; 3];

const BRADFORD: Mat3 = [
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
];

const BRADFORD_INV: Mat3 = [
    [0.986_992_9, -0.147_054_3, 0.159_962_7],
    [0.432_305_3, 0.518_360_3, 0.049_291_2],
    [-0.008_528_7, 0.040_042_8, 0.968_486_7],
];

const SRGB_TO_XYZ: Mat3 = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
];

const XYZ_TO_SRGB: Mat3 = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// Valid range of the locus approximation.
const LOCUS_MIN_K: f64 = 1667.0;
const LOCUS_MAX_K: f64 = 25000.0;

fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn apply_mat(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// CIE 1931 chromaticity of a blackbody at `kelvin`.
pub(crate) fn planckian_xy(kelvin: f64) -> (f64, f64) {
    let t = kelvin.clamp(LOCUS_MIN_K, LOCUS_MAX_K);
    let (t2, t3) = (t * t, t * t * t);
    let x = if t <= 4000.0 {
        -0.266_123_9e9 / t3 - 0.234_358_9e6 / t2 + 0.877_695_6e3 / t + 0.179_910
    } else {
        -3.025_846_9e9 / t3 + 2.107_037_9e6 / t2 + 0.222_634_7e3 / t + 0.240_390
    };
    let (x2, x3) = (x * x, x * x * x);
    let y = if t <= 2222.0 {
        -1.106_381_4 * x3 - 1.348_110_20 * x2 + 2.185_558_32 * x - 0.202_196_83
    } else if t <= 4000.0 {
        -0.954_947_6 * x3 - 1.374_185_93 * x2 + 2.091_370_15 * x - 0.167_488_67
    } else {
        3.081_758_0 * x3 - 5.873_386_70 * x2 + 3.751_129_97 * x - 0.370_014_83
    };
    (x, y)
}

/// XYZ of the white at `kelvin`, normalized to Y = 1.
fn white_xyz(kelvin: f64) -> [f64; 3] {
    let (x, y) = planckian_xy(kelvin);
    [x / y, 1.0, (1.0 - x - y) / y]
}

/// Linear sRGB matrix adapting colors lit by `source_k` to `target_k`.
pub(crate) fn adaptation_matrix(source_k: f64, target_k: f64) -> [[f32; 3]; 3] {
    let src = apply_mat(&BRADFORD, white_xyz(source_k));
    let dst = apply_mat(&BRADFORD, white_xyz(target_k));
    let scale: Mat3 = [
        [dst[0] / src[0], 0.0, 0.0],
        [0.0, dst[1] / src[1], 0.0],
        [0.0, 0.0, dst[2] / src[2]],
    ];
    let cone = mul(&BRADFORD_INV, &mul(&scale, &BRADFORD));
    let full = mul(&XYZ_TO_SRGB, &mul(&cone, &SRGB_TO_XYZ));
    full.map(|row| row.map(|v| v as f32))
}

pub(crate) fn apply_correction(img: &mut LinearFrame, correction_k: f64, target_k: f64) {
    let m = adaptation_matrix(target_k - correction_k, target_k);
    for px in img.rgb.iter_mut() {
        let [r, g, b] = *px;
        *px = [
            (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 1.0),
            (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 1.0),
            (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 1.0),
        ];
    }
}

/// Scale each pixel's distance from its gray by `boost`.
pub(crate) fn apply_saturation(img: &mut LinearFrame, boost: f32) {
    for px in img.rgb.iter_mut() {
        let y = luminance(*px);
        for c in px.iter_mut() {
            *c = (y + boost * (*c - y)).clamp(0.0, 1.0);
        }
    }
}
