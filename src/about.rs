pub const KEYGEN_DISPLAY_VERSION: &str = env!("KEYGEN_DISPLAY_VERSION");
pub const KEYGEN_BUILD_N: &str = env!("KEYGEN_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "dna-keygen {}\nBuild {}\nVendor and codec key issuer over the ACTG alphabet",
        KEYGEN_DISPLAY_VERSION, KEYGEN_BUILD_N
    )
}
