/// Numeric tag identifier as stored in the `tag` field of a record.
/// Examples: `0` (`B_AGE`), `38` (`I_BIOMARKER`), `48` (outside)
pub type TagId = i64;
/// Entity type name with the BIO prefix stripped.
/// Examples: `BIOMARKER`, `HABIT-QUANTITY`, `CANCER_CONCEPT`
pub type EntityType = String;
/// Surface form of an entity span (space-joined tokens, case preserved).
/// Examples: `her2 +3`, `2020`, `Hospital de Día`
pub type Phrase = String;
/// 1-based line number inside a record file.
/// Example: `17`
pub type LineNumber = usize;
/// Normalized sentence key used to group duplicate records.
/// Example: `no cambios`
pub type SentenceKey = String;
/// Token text as it appears in the `sentencia` field.
/// Examples: `HER2/neu`, `90%`, `(`
pub type Token = String;
/// File name (or path string) used in human-readable reports.
/// Example: `historia_023.json`
pub type DisplayName = String;
