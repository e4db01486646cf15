// Pitch type code -> display name.

/// Codes seen in the stats feed. Both the house codes (`4S`, `CT`, `CB`) and
/// the Statcast spellings (`FF`, `FC`, `CU`) resolve to the same names.
const PITCH_NAMES: &[(&str, &str)] = &[
    ("4S", "Four-Seam"),
    ("FF", "Four-Seam"),
    ("2S", "Two-Seam"),
    ("FT", "Two-Seam"),
    ("SI", "Sinker"),
    ("CH", "Changeup"),
    ("SL", "Slider"),
    ("CT", "Cutter"),
    ("FC", "Cutter"),
    ("SP", "Splitter"),
    ("SW", "Sweeper"),
    ("KN", "Knuckleball"),
    ("CB", "Curveball"),
    ("CU", "Curveball"),
];

/// Display name for a pitch code. Unknown codes come back unchanged.
pub fn pitch_name(code: &str) -> &str {
    PITCH_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}
