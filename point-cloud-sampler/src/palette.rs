/// Colour identities and colorscales handed to the renderer.
use serde::{Deserialize, Serialize};

/// Colour stop of a two-colour scale, position in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f32,
    pub color: String,
}

/// Scale from a neutral grey at density 0 to the variant colour at 1.
pub fn colorscale(rgb: [u8; 3], floor: u8) -> Vec<ColorStop> {
    let [r, g, b] = rgb;
    vec![
        ColorStop {
            position: 0.0,
            color: format!("rgb({floor},{floor},{floor})"),
        },
        ColorStop {
            position: 1.0,
            color: format!("rgb({r},{g},{b})"),
        },
    ]
}
