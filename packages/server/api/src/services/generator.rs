//! Artifact synthesizer. Purely deterministic: the same description and
//! requirements always produce byte-identical output, and no I/O happens
//! here. The application stub is a fixed placeholder; this generator has
//! no real code-generation intelligence.

/// Ordered set of (path, content) files to commit. README first, then
/// the application stub, then the requirements manifest when present.
/// Paths never collide.
pub type ArtifactSet = Vec<(String, String)>;

const APP_STUB: &str = r#"from fastapi import FastAPI

app = FastAPI()

@app.get("/")
def root():
    return {"message": "Hello from generated app"}
"#;

pub fn synthesize(description: &str, requirements: Option<&[String]>) -> ArtifactSet {
    let mut files: ArtifactSet = Vec::new();

    let readme = format!(
        "# Generated App\n\nThis app was generated automatically.\n\nDescription:\n\n{}\n",
        description
    );
    files.push(("README.md".to_string(), readme));

    files.push(("app.py".to_string(), APP_STUB.to_string()));

    // No manifest at all when requirements are absent or empty.
    if let Some(reqs) = requirements {
        if !reqs.is_empty() {
            let manifest = reqs.join("\n") + "\n";
            files.push(("requirements.txt".to_string(), manifest));
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let reqs = vec!["fastapi".to_string(), "uvicorn".to_string()];
        let a = synthesize("a test app", Some(&reqs));
        let b = synthesize("a test app", Some(&reqs));
        assert_eq!(a, b);
    }

    #[test]
    fn embeds_description_verbatim_in_readme() {
        let files = synthesize("an app with spaces & symbols <>", None);
        let (path, readme) = &files[0];
        assert_eq!(path, "README.md");
        assert!(readme.contains("an app with spaces & symbols <>"));
    }

    #[test]
    fn omits_manifest_when_requirements_absent_or_empty() {
        let files = synthesize("demo", None);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, "README.md");
        assert_eq!(files[1].0, "app.py");

        let files = synthesize("demo", Some(&[]));
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|(p, _)| p != "requirements.txt"));
    }

    #[test]
    fn manifest_joins_requirements_one_per_line() {
        let reqs = vec!["fastapi".to_string(), "httpx".to_string()];
        let files = synthesize("demo", Some(&reqs));
        assert_eq!(files.len(), 3);
        assert_eq!(files[2].0, "requirements.txt");
        assert_eq!(files[2].1, "fastapi\nhttpx\n");
    }

    #[test]
    fn no_duplicate_paths() {
        let reqs = vec!["fastapi".to_string()];
        let files = synthesize("demo", Some(&reqs));
        let mut paths: Vec<&str> = files.iter().map(|(p, _)| p.as_str()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), files.len());
    }
}
