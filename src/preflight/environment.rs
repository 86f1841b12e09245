//! Wrapping environment checks (directories, config templates).

use std::fs;
use std::path::Path;

use crate::libs::LibraryProfile;
use crate::library::Library;
use crate::materialize::ConfigArtifact;
use crate::pipeline::WrapContext;
use crate::platform::Platform;

use super::types::CheckResult;

/// Directory of the Homebrew OpenSSL 1.1 keg the tor configure script links against.
const DARWIN_OPENSSL_KEG: &str = "/usr/local/opt/openssl@1.1";

pub fn check_environment(ctx: &WrapContext) -> Vec<CheckResult> {
    let mut results = vec![check_writable(&ctx.output_dir)];
    results.extend(check_templates(&ctx.templates));

    if ctx.platform == Platform::Darwin {
        if Path::new(DARWIN_OPENSSL_KEG).is_dir() {
            results.push(CheckResult::pass_with("openssl@1.1", DARWIN_OPENSSL_KEG));
        } else {
            results.push(CheckResult::fail(
                "openssl@1.1",
                "Not found. Install with 'brew install openssl@1.1'. Required by the tor configure script",
            ));
        }
    }

    results
}

/// The output directory exists or can be created, and accepts files.
fn check_writable(output_dir: &Path) -> CheckResult {
    let name = "output directory writable";
    if let Err(e) = fs::create_dir_all(output_dir) {
        return CheckResult::fail(name, &format!("Cannot create {}: {}", output_dir.display(), e));
    }
    let marker = output_dir.join(".preflight-test");
    match fs::write(&marker, "test") {
        Ok(()) => {
            let _ = fs::remove_file(&marker);
            CheckResult::pass_with(name, &output_dir.display().to_string())
        }
        Err(e) => CheckResult::fail(name, &format!("Cannot write to {}: {}", output_dir.display(), e)),
    }
}

/// Every config template a profile refers to exists.
pub(super) fn check_templates(templates: &Path) -> Vec<CheckResult> {
    Library::ALL
        .iter()
        .map(|library| LibraryProfile::for_library(*library))
        .filter(|profile| profile.config_root.is_some())
        .map(|profile| {
            let dir = templates.join(profile.library.name());
            let missing: Vec<String> = (profile.config)()
                .iter()
                .map(|artifact| match artifact {
                    ConfigArtifact::Family(family) => family.template,
                    ConfigArtifact::Verbatim { template, .. } => *template,
                })
                .filter(|template| !dir.join(template).is_file())
                .map(str::to_string)
                .collect();

            let name = format!("{} config templates", profile.library);
            if missing.is_empty() {
                CheckResult::pass_with(&name, &dir.display().to_string())
            } else {
                CheckResult::fail(&name, &format!("Missing in {}: {}", dir.display(), missing.join(", ")))
            }
        })
        .collect()
}
