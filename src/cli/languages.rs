use crate::intel::parser::LANGUAGES;

/// List supported languages and their extensions.
pub fn list_languages() {
    println!("Supported languages:");
    for spec in LANGUAGES {
        let exts: Vec<String> = spec.extensions.iter().map(|e| format!(".{}", e)).collect();
        println!("  {:<12} {}", spec.tag, exts.join(", "));
    }
}
