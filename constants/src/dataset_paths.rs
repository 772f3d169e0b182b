/// Conventional locations of the (N, 3) coordinate array, tried in order
/// before falling back to a structural scan.
pub const POSITION_CANDIDATES: &[&str] = &[
    "/PartType1/Coordinates",
    "/particles/pos",
    "/pos",
    "/Coords",
    "/data/pos",
    "PartType1/Coordinates",
];

/// Decimal places kept for stored coordinates
pub const COORDINATE_PRECISION: u32 = 3;

/// Missing rows tolerated inside a single range read (0 = exact runs)
pub const READ_GAP_TOLERANCE: usize = 0;
