//! Artifact selection within a repository listing.
//!
//! # Selection Rules
//!
//! 1. A file carrying the requested quantization tag wins outright.
//! 2. Otherwise walk [`Quantization::ALL`] from highest fidelity downward and
//!    take the first tag that is present.
//! 3. If no file carries a recognised tag, take the first artifact.
//!
//! Split artifacts (`*-00001-of-00003.gguf`) are never selected: the importer
//! registers a single file, and one part of a split model is not a model.
//!
//! Files are compared in lexicographic order, so the choice never depends on
//! the order the metadata service happened to list them in.

use ohhhllama_core::Quantization;

/// File suffix of ready-to-run artifacts.
pub const ARTIFACT_SUFFIX: &str = ".gguf";

/// Whether `file` is a ready-to-run artifact.
pub fn is_artifact(file: &str) -> bool {
    file.to_ascii_lowercase().ends_with(ARTIFACT_SUFFIX)
}

/// Whether `file` is one part of a split artifact (`name-00001-of-00003.gguf`).
///
/// The `-<digits>-of-<digits>` marker must sit directly before the extension.
pub fn is_shard(file: &str) -> bool {
    let name = file.rsplit('/').next().unwrap_or(file);
    let Some((stem, _ext)) = name.rsplit_once('.') else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let mut parts = stem.rsplitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(total), Some("of"), Some(rest)) if all_digits(total) => rest
            .rsplit_once('-')
            .is_some_and(|(_, index)| all_digits(index)),
        _ => false,
    }
}

fn file_name(file: &str) -> &str {
    file.rsplit('/').next().unwrap_or(file)
}

/// Raw weight files the converter can read.
///
/// Pickled weights count only under their conventional `pytorch_model`
/// name, so unrelated `.bin` files such as `training_args.bin` stay out.
pub fn is_weight_file(file: &str) -> bool {
    let name = file_name(file);
    name.ends_with(".safetensors")
        || (name.starts_with("pytorch_model") && name.ends_with(".bin"))
}

/// Files that make up a raw model snapshot: weights, configuration, tokenizer.
pub fn is_snapshot_file(file: &str) -> bool {
    let name = file_name(file);
    is_weight_file(name) || name.ends_with(".json") || name.starts_with("tokenizer")
}

/// The snapshot to fetch for conversion, or `None` when the listing has no
/// weights at all.
///
/// When both weight formats are published only the safetensors set is kept,
/// so the same tensors are never downloaded twice.
pub fn snapshot_files(files: &[String]) -> Option<Vec<String>> {
    let has_safetensors = files
        .iter()
        .any(|f| file_name(f).ends_with(".safetensors"));
    let snapshot: Vec<String> = files
        .iter()
        .filter(|f| is_snapshot_file(f))
        .filter(|f| !(has_safetensors && file_name(f).ends_with(".bin")))
        .cloned()
        .collect();
    snapshot
        .iter()
        .any(|f| is_weight_file(f))
        .then_some(snapshot)
}

/// The chosen artifact and the tag detected in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub file: String,
    pub quant: Option<Quantization>,
}

/// Pick the artifact to fetch for `requested` from a repository listing.
///
/// Returns `None` when the listing has no single-file artifacts.
pub fn select_artifact(files: &[String], requested: Quantization) -> Option<Selection> {
    let mut artifacts: Vec<&String> = files
        .iter()
        .filter(|f| is_artifact(f) && !is_shard(f))
        .collect();
    artifacts.sort();

    let tagged: Vec<(&String, Option<Quantization>)> = artifacts
        .iter()
        .map(|f| (*f, Quantization::from_filename(f)))
        .collect();

    let find = |quant: Quantization| {
        tagged
            .iter()
            .find(|(_, q)| *q == Some(quant))
            .map(|(f, q)| Selection {
                file: (*f).clone(),
                quant: *q,
            })
    };

    if let Some(exact) = find(requested) {
        return Some(exact);
    }

    if let Some(nearest) = Quantization::ALL.iter().find_map(|q| find(*q)) {
        return Some(nearest);
    }

    artifacts.first().map(|f| Selection {
        file: (*f).clone(),
        quant: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_exact_match_wins() {
        let files = listing(&[
            "model.Q8_0.gguf",
            "model.Q4_K_M.gguf",
            "model.Q5_K_M.gguf",
            "README.md",
        ]);
        let sel = select_artifact(&files, Quantization::Q4KM).unwrap();
        assert_eq!(sel.file, "model.Q4_K_M.gguf");
        assert_eq!(sel.quant, Some(Quantization::Q4KM));
    }

    #[test]
    fn test_fallback_is_highest_fidelity_available() {
        let files = listing(&["model.Q4_K_M.gguf", "model.Q5_K_M.gguf", "model.Q8_0.gguf"]);
        for _ in 0..10 {
            let sel = select_artifact(&files, Quantization::Q6K).unwrap();
            assert_eq!(sel.file, "model.Q8_0.gguf");
        }
    }

    #[test]
    fn test_every_requested_tag_against_fixed_listing() {
        let files = listing(&["m.Q5_K_M.gguf", "m.Q8_0.gguf", "m.Q4_K_M.gguf"]);
        for requested in Quantization::ALL {
            let sel = select_artifact(&files, requested).unwrap();
            let expected = match requested {
                Quantization::Q5KM => "m.Q5_K_M.gguf",
                Quantization::Q4KM => "m.Q4_K_M.gguf",
                _ => "m.Q8_0.gguf",
            };
            assert_eq!(sel.file, expected, "requested {requested}");
        }
    }

    #[test]
    fn test_listing_order_does_not_matter() {
        let a = listing(&["x.Q2_K.gguf", "x.Q3_K_M.gguf"]);
        let b = listing(&["x.Q3_K_M.gguf", "x.Q2_K.gguf"]);
        assert_eq!(
            select_artifact(&a, Quantization::Q4KM),
            select_artifact(&b, Quantization::Q4KM)
        );
        assert_eq!(
            select_artifact(&a, Quantization::Q4KM).unwrap().file,
            "x.Q3_K_M.gguf"
        );
    }

    #[test]
    fn test_bf16_is_not_read_as_f16() {
        let files = listing(&["model-BF16.gguf", "model-F16.gguf"]);
        let sel = select_artifact(&files, Quantization::F16).unwrap();
        assert_eq!(sel.file, "model-F16.gguf");
    }

    #[test]
    fn test_untagged_falls_back_to_first_file() {
        let files = listing(&["zeta.gguf", "alpha.gguf"]);
        let sel = select_artifact(&files, Quantization::Q4KM).unwrap();
        assert_eq!(sel.file, "alpha.gguf");
        assert_eq!(sel.quant, None);
    }

    #[test]
    fn test_no_artifacts() {
        let files = listing(&["config.json", "model.safetensors"]);
        assert!(select_artifact(&files, Quantization::Q4KM).is_none());
    }

    #[test]
    fn test_snapshot_files() {
        assert!(is_snapshot_file("model-00001-of-00002.safetensors"));
        assert!(is_snapshot_file("config.json"));
        assert!(is_snapshot_file("tokenizer.model"));
        assert!(is_snapshot_file("sub/tokenizer_config.json"));
        assert!(is_snapshot_file("pytorch_model-00001-of-00002.bin"));
        assert!(!is_snapshot_file("README.md"));
        assert!(!is_snapshot_file("training_args.bin"));
    }

    #[test]
    fn test_snapshot_prefers_safetensors_over_pickled_weights() {
        let files = listing(&[
            "config.json",
            "model.safetensors",
            "pytorch_model.bin",
            "tokenizer.json",
        ]);
        assert_eq!(
            snapshot_files(&files).unwrap(),
            listing(&["config.json", "model.safetensors", "tokenizer.json"])
        );
    }

    #[test]
    fn test_snapshot_accepts_pickled_weights_alone() {
        let files = listing(&["config.json", "pytorch_model.bin", "training_args.bin"]);
        assert_eq!(
            snapshot_files(&files).unwrap(),
            listing(&["config.json", "pytorch_model.bin"])
        );
    }

    #[test]
    fn test_snapshot_without_weights() {
        let files = listing(&["config.json", "tokenizer.json", "README.md"]);
        assert!(snapshot_files(&files).is_none());
    }

    #[test]
    fn test_is_shard() {
        assert!(is_shard("model-Q4_K_M-00001-of-00003.gguf"));
        assert!(is_shard("sub/llama-3-70b.Q8_0-00002-of-00002.gguf"));
        assert!(!is_shard("model.Q4_K_M.gguf"));
        assert!(!is_shard("has-numbers-123.gguf"));
        assert!(!is_shard("model-of-something.gguf"));
        assert!(!is_shard("noextension"));
    }

    #[test]
    fn test_shards_are_never_selected() {
        let files = listing(&[
            "big-Q8_0-00001-of-00002.gguf",
            "big-Q8_0-00002-of-00002.gguf",
            "big-Q4_K_M.gguf",
        ]);
        let sel = select_artifact(&files, Quantization::Q8_0).unwrap();
        assert_eq!(sel.file, "big-Q4_K_M.gguf");

        let only_shards = listing(&["big-Q8_0-00001-of-00002.gguf", "big-Q8_0-00002-of-00002.gguf"]);
        assert!(select_artifact(&only_shards, Quantization::Q8_0).is_none());
    }
}
