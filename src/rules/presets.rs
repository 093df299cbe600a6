//! Built-in rule sets
//!
//! Each preset covers one tool: pushing with git, destructive AWS CLI calls
//! or destructive kubectl calls.

use super::Rule;

/// A named, built-in rule
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    /// Name used with `--preset` and `general.presets`
    pub name: &'static str,
    pub description: &'static str,
    pub command: &'static str,
    pub patterns: &'static [&'static str],
}

impl Preset {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        command: &'static str,
        patterns: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            description,
            command,
            patterns,
        }
    }

    /// Build the rule this preset stands for
    pub fn rule(&self) -> Rule {
        Rule::new(self.command, self.patterns.iter().copied())
    }
}

/// Destructive kubectl operations, plus any delete or patch aimed at a
/// protected namespace. `--namespace NS` also matches `--namespace=NS`.
static KUBECTL_PATTERNS: &[&str] = &[
    "delete namespace",
    "delete --all",
    "delete deployment",
    "delete service",
    "delete pv",
    "delete pvc",
    "patch --type=merge",
    "delete -n kube-system",
    "delete --namespace kube-system",
    "delete -n kube-public",
    "delete --namespace kube-public",
    "delete -n kube-node-lease",
    "delete --namespace kube-node-lease",
    "delete -n default",
    "delete --namespace default",
    "delete -n production",
    "delete --namespace production",
    "delete -n prod",
    "delete --namespace prod",
    "delete -n staging",
    "delete --namespace staging",
    "patch -n kube-system",
    "patch --namespace kube-system",
    "patch -n kube-public",
    "patch --namespace kube-public",
    "patch -n kube-node-lease",
    "patch --namespace kube-node-lease",
    "patch -n default",
    "patch --namespace default",
    "patch -n production",
    "patch --namespace production",
    "patch -n prod",
    "patch --namespace prod",
    "patch -n staging",
    "patch --namespace staging",
];

pub static PRESETS: &[Preset] = &[
    Preset::new("git", "Block git push", "git", &["push"]),
    Preset::new(
        "aws",
        "Block destructive AWS CLI operations",
        "aws",
        &[
            "s3api delete-bucket",
            "s3 rm --recursive",
            "iam delete-user",
            "iam delete-role",
            "ec2 terminate-instances",
            "rds delete-db-instance",
            "cloudformation delete-stack",
        ],
    ),
    Preset::new(
        "kubectl",
        "Block destructive kubectl operations",
        "kubectl",
        KUBECTL_PATTERNS,
    ),
];

/// Look up a preset by name (case-insensitive)
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
}

/// Names of all presets, for help text and error messages
pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|preset| preset.name).collect()
}
