//! Integration tests for the command detector

use bash_block::rules::presets;
use bash_block::{CommandDetector, Rule};

fn git_push() -> CommandDetector {
    CommandDetector::new(vec![Rule::new("git", ["push"])], 0)
}

fn blocked(detector: &mut CommandDetector, command: &str) -> bool {
    let blocked = detector.analyze(command);
    // a block always explains itself, an allow never carries issues
    assert_eq!(
        blocked,
        !detector.issues().is_empty(),
        "issues out of sync for {:?}: {:?}",
        command,
        detector.issues()
    );
    blocked
}

/// `sh -c "..."` wrapped `levels` times around `innermost`
fn nested_shells(levels: usize, innermost: &str) -> String {
    let mut command = innermost.to_string();
    for _ in 0..levels {
        let escaped = command.replace('\\', "\\\\").replace('"', "\\\"");
        command = format!("sh -c \"{}\"", escaped);
    }
    command
}

// ============================================================================
// Scenario seeds
// ============================================================================

#[test]
fn test_git_push_blocked_with_pattern_issue() {
    let mut d = git_push();
    assert!(blocked(&mut d, "git push origin main"));
    assert!(d.issues().iter().any(|i| i.contains("git pattern")));
}

#[test]
fn test_git_pull_allowed() {
    let mut d = git_push();
    assert!(!blocked(&mut d, "git pull"));
    assert!(d.issues().is_empty());
}

#[test]
fn test_aws_glob_patterns() {
    let mut d = CommandDetector::new(vec![Rule::new("aws", ["delete-*", "terminate-*"])], 0);
    assert!(blocked(&mut d, "aws ec2 terminate-instances --instance-ids i-1"));
    assert!(blocked(&mut d, "aws s3api delete-bucket --bucket b"));
    assert!(!blocked(&mut d, "aws ec2 describe-instances"));
}

#[test]
fn test_kubectl_exception() {
    let rule = Rule::new("kubectl", ["delete"]).with_exceptions(["delete pod"]);
    let mut d = CommandDetector::new(vec![rule], 0);
    assert!(!blocked(&mut d, "kubectl delete pod my-pod"));
    assert!(blocked(&mut d, "kubectl delete namespace prod"));
}

#[test]
fn test_prose_in_echo_allowed_without_rules() {
    let mut d = CommandDetector::new(vec![], 0);
    assert!(!blocked(&mut d, r#"echo "Remember to git push later""#));
}

#[test]
fn test_bash_c_string_reanalyzed() {
    let mut d = git_push();
    assert!(blocked(&mut d, r#"bash -c "git push""#));
    assert!(d
        .issues()
        .iter()
        .any(|i| i.starts_with("Blocked command found in string")));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_idempotent() {
    let mut d = git_push();
    for command in ["git push", "git status", "bash -c 'git push'", "echo 'open"] {
        let first = (d.analyze(command), d.issues());
        let second = (d.analyze(command), d.issues());
        assert_eq!(first, second, "{}", command);
    }
}

#[test]
fn test_wildcard_blocks_bare_and_argumented() {
    let mut d = CommandDetector::new(vec![Rule::new("terraform", ["*"])], 0);
    assert!(blocked(&mut d, "terraform"));
    assert!(blocked(&mut d, "terraform plan"));
    assert!(blocked(&mut d, "terraform apply -auto-approve"));
}

#[test]
fn test_empty_patterns_never_block_bare_command() {
    let mut d = CommandDetector::new(vec![Rule::new("git", Vec::<String>::new())], 0);
    assert!(!blocked(&mut d, "git"));
    assert!(!blocked(&mut d, "git push"));
}

#[test]
fn test_dynamic_command_always_blocked() {
    let mut d = CommandDetector::new(vec![], 0);
    for command in ["$CMD push", "${CMD} push", "$(echo git) push", "`echo git` push"] {
        assert!(blocked(&mut d, command), "{}", command);
        assert!(d.issues()[0].contains("dynamic substitution"), "{}", command);
    }
}

#[test]
fn test_dynamic_subcommand_blocked() {
    let mut d = git_push();
    assert!(blocked(&mut d, "CMD=push; git $CMD"));
    assert!(blocked(&mut d, "git \"$(echo push)\""));
    assert!(blocked(&mut d, "git pu$((1))sh"));
}

#[test]
fn test_path_and_extension_normalization() {
    let mut d = git_push();
    for command in [
        "git push",
        "/usr/bin/git push",
        "./git push",
        "git.exe push",
        "GIT PUSH",
        r#""C:\Program Files\Git\bin\git.exe" push"#,
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
    }
    assert!(!blocked(&mut d, "git pull"));
    assert!(!blocked(&mut d, "gitk push"));
}

#[test]
fn test_arguments_as_commands() {
    let mut d = git_push();
    assert!(blocked(&mut d, "xargs git push"));
    assert!(blocked(&mut d, r"find . -exec git push {} \;"));
    assert!(blocked(&mut d, "timeout 10 git push"));
    assert!(!blocked(&mut d, "xargs git log"));
}

#[test]
fn test_recursion_guard() {
    let mut d = CommandDetector::new(vec![Rule::new("git", ["push"])], 10);
    let command = nested_shells(14, "true");
    assert!(blocked(&mut d, &command));
    assert!(d.issues()[0].starts_with("Maximum nesting depth (10) exceeded"));
}

#[test]
fn test_recursion_guard_small_depth() {
    let mut d = CommandDetector::new(vec![Rule::new("git", ["push"])], 3);
    assert!(!blocked(&mut d, &nested_shells(2, "git status")));
    assert!(blocked(&mut d, &nested_shells(2, "git push")));
    assert!(blocked(&mut d, &nested_shells(6, "git status")));
    assert!(d.issues()[0].contains("Maximum nesting depth"));
}

#[test]
fn test_unparseable_input_blocked() {
    let mut d = CommandDetector::new(vec![], 0);
    for command in ["echo 'unclosed", "git push \"origin", "echo $(ls", "(git status"] {
        assert!(blocked(&mut d, command), "{:?} should be blocked", command);
        assert!(d.issues()[0].starts_with("Unable to parse shell expression"));
    }
}

#[test]
fn test_whitespace_variants() {
    let mut d = CommandDetector::new(vec![Rule::new("kubectl", ["delete namespace"])], 0);
    assert!(blocked(&mut d, "kubectl delete namespace prod"));
    assert!(blocked(&mut d, "kubectl   delete\tnamespace prod"));
    assert!(blocked(&mut d, "kubectl 'delete   namespace' prod"));
    assert!(blocked(&mut d, "kubectl delete --wait=false namespace prod"));
}

// ============================================================================
// Disguises
// ============================================================================

#[test]
fn test_quote_splitting() {
    let mut d = git_push();
    for command in [
        "g'i't push",
        "\"g\"it p\"us\"h",
        r"g\it pu\sh",
        r"$'\x67\x69\x74' push",
        r"$'\147\151\164' push",
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
    }
}

#[test]
fn test_compound_commands() {
    let mut d = git_push();
    for command in [
        "cd repo && git push",
        "git status; git push",
        "false || git push",
        "echo hi | git push",
        "(git push)",
        "{ git push; }",
        "if true; then git push; fi",
        "for r in a b; do git push; done",
        "while true; do git push; break; done",
        "echo $(git push)",
        "echo `git push`",
        "cat <(git push)",
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
    }
}

#[test]
fn test_nested_interpreters_and_eval() {
    let mut d = git_push();
    for command in [
        "sh -c 'git push'",
        "zsh -c 'cd x; git push'",
        "eval 'git push'",
        "eval \"git push\"",
        r#"bash -c "sh -c 'git push'""#,
        "echo 'git push' | sh",
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
    }
    assert!(!blocked(&mut d, "bash -c 'git status'"));
    assert!(!blocked(&mut d, "bash script.sh"));
}

#[test]
fn test_redirect_between_command_and_arguments() {
    let mut d = git_push();
    for command in [
        "git > /dev/null push",
        "git 2>&1 push --force",
        "git 2>/dev/null push --force",
        "git >out push origin main",
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
        assert!(d.issues()[0].contains("git pattern"), "{}", command);
    }
    assert!(!blocked(&mut d, "git status > /dev/null 2>&1"));
}

#[test]
fn test_interpreters_in_wrapper_position() {
    let mut d = git_push();
    for command in [
        "sudo bash -c 'git push'",
        "timeout 5 sh -c 'git push'",
        r"find . -exec sh -c 'git push' \;",
        "xargs -I{} sh -c 'git push {}'",
        "nice -n 10 /bin/zsh -c 'cd repo && git push'",
    ] {
        assert!(blocked(&mut d, command), "{} should be blocked", command);
    }
    assert!(!blocked(&mut d, "sudo bash -c 'git fetch'"));
}

#[test]
fn test_interpreter_stdin() {
    let mut d = git_push();
    assert!(blocked(&mut d, "bash <<< 'git push'"));
    assert!(blocked(&mut d, "sh <<EOF\ngit push\nEOF"));
    assert!(!blocked(&mut d, "sh <<EOF\ngit log\nEOF"));
}

#[test]
fn test_reversed_payload() {
    let mut d = git_push();
    assert!(blocked(&mut d, "echo 'hsup tig' | rev | sh"));
}

#[test]
fn test_false_positive_guards() {
    let mut d = git_push();
    for command in [
        "base64 -d input.txt",
        "cat /home/user/projects/my-application/src/components/Button.tsx",
        "git log --oneline -n 5",
        "grep -r 'push' src/",
        "npm run build && npm test",
        "ls -la | grep rust",
    ] {
        assert!(!blocked(&mut d, command), "{} should be allowed", command);
    }
}

#[test]
fn test_presets() {
    let rules = presets::PRESETS.iter().map(|p| p.rule()).collect();
    let mut d = CommandDetector::new(rules, 0);
    assert!(blocked(&mut d, "git push --force"));
    assert!(blocked(&mut d, "aws s3 rm s3://bucket --recursive"));
    assert!(blocked(&mut d, "kubectl delete namespace prod"));
    assert!(!blocked(&mut d, "aws s3 ls"));
    assert!(!blocked(&mut d, "kubectl get pods"));
}

#[test]
fn test_kubectl_protected_namespaces() {
    let rules = vec![presets::find("kubectl").unwrap().rule()];
    let mut d = CommandDetector::new(rules, 0);
    assert!(blocked(&mut d, "kubectl delete pod x -n kube-system"));
    assert!(blocked(&mut d, "kubectl patch deploy x -n production -p '{}'"));
    assert!(blocked(&mut d, "kubectl delete pod x --namespace=prod"));
    assert!(!blocked(&mut d, "kubectl get pods -n kube-system"));
    assert!(!blocked(&mut d, "kubectl delete pod x -n dev"));
}

#[test]
fn test_empty_input_allowed() {
    let mut d = git_push();
    assert!(!blocked(&mut d, ""));
    assert!(!blocked(&mut d, "   "));
}
