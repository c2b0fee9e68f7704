//! Collision-avoidance naming for copy and move destinations.

use std::path::Path;

/// Produce a name derived from `name` that is free in `dir`.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", and so on,
/// probing each candidate through `exists` until one is free. The
/// counter always starts at 1 and increments by 1; freed lower numbers
/// are never reused within one call. Returns `name` unchanged when it
/// is already free.
pub fn unique_name_in(dir: &Path, name: &str, exists: impl Fn(&Path) -> bool) -> String {
    if !exists(&dir.join(name)) {
        return name.to_string();
    }

    let as_path = Path::new(name);
    let stem = as_path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let extension = as_path.extension().and_then(|e| e.to_str());

    let mut counter: u64 = 1;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{} ({}).{}", stem, counter, ext),
            None => format!("{} ({})", stem, counter),
        };
        if !exists(&dir.join(&candidate)) {
            return candidate;
        }
        counter += 1;
    }
}
