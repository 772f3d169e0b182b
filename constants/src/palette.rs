/// dodgerblue
pub const RGB_CDM: [u8; 3] = [30, 144, 255];

/// forest green
pub const RGB_NB: [u8; 3] = [34, 139, 34];

/// crimson
pub const RGB_FCT: [u8; 3] = [220, 20, 60];

/// Grey level of the low end of every variant colorscale
pub const COLORSCALE_FLOOR: u8 = 35;
