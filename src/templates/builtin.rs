// Built-in templates for scaffolded files and prompts

/// Built-in template names
pub const PROMPT_MD: &str = "prompt_md";
pub const AGENT_MD: &str = "agent_md";
pub const SKILL_SEED: &str = "skill_seed";
pub const COMPOUND_PROMPT: &str = "compound_prompt";
pub const LAUNCHD_PLIST: &str = "launchd_plist";
pub const CRON_LINE: &str = "cron_line";

/// Get a built-in template by name
pub fn get_builtin_template(name: &str) -> Option<&'static str> {
    match name {
        PROMPT_MD => Some(PROMPT_MD_TEMPLATE),
        AGENT_MD => Some(AGENT_MD_TEMPLATE),
        SKILL_SEED => Some(SKILL_SEED_TEMPLATE),
        COMPOUND_PROMPT => Some(COMPOUND_PROMPT_TEMPLATE),
        LAUNCHD_PLIST => Some(LAUNCHD_PLIST_TEMPLATE),
        CRON_LINE => Some(CRON_LINE_TEMPLATE),
        _ => None,
    }
}

/// List all built-in template names
pub fn list_builtin_templates() -> Vec<&'static str> {
    vec![
        PROMPT_MD,
        AGENT_MD,
        SKILL_SEED,
        COMPOUND_PROMPT,
        LAUNCHD_PLIST,
        CRON_LINE,
    ]
}

// Template definitions

const PROMPT_MD_TEMPLATE: &str = r#"# Ralph - Iteration Instructions

You are one iteration of an autonomous loop working on **{{ project }}**.
Your context is fresh - you have no memory of previous iterations. All
context lives in files.

## IMPORTANT RULES (You MUST follow these)

1. **Work on ONE story per iteration** - complete it fully before stopping
2. **Make minimal, focused changes** - no unrelated refactoring
3. **Be honest about completion** - only set `passes: true` when every
   acceptance criterion is truly met
4. **Follow existing patterns** - check how similar code is written first
{% if use_xgit %}5. **Use `xgit` instead of `git`** for every git operation - it is the
   sandboxed wrapper installed for this project
{% endif %}

## Your Task

1. **Read the backlog** at `{{ prd_path }}`
   - Stories have: id (like {{ ticket_prefix }}-001), title, description,
     acceptanceCriteria, priority, passes, blocked, dependsOn
2. **Read the progress journal** at `{{ progress_path }}`
   - Learnings from previous iterations; do not repeat old mistakes
3. **Read `AGENT.md`** and any files under `{{ skills_dir }}`
   - Project conventions and accumulated skills
4. **Pick the next story**: among stories where `passes` is false,
   `blocked` is false, and every id in `dependsOn` belongs to a story with
   `passes` true, take the lowest `priority` value; break ties by list
   order. If none qualifies, stop.
5. **Implement the story** - clean code, tests, all acceptance criteria
{% if create_prs %}6. **Branch and PR**: work on a branch named
   `{% if branch_prefix %}{{ branch_prefix }}{% endif %}{story id}-{kebab-case title, max 30 chars}`.
   Base it on the default branch, or on the first dependency's branch when
   `dependsOn` is non-empty. Open a pull request targeting the branch you
   based from{% if use_pr_template %}, filling in the repository's PR template{% endif %}.
   Record the branch name in the story's `branch` field and the PR number
   in `pullRequest`.
{% if wait_for_merge %}   Do NOT start a story whose dependency PR has not merged yet.
{% endif %}{% else %}6. **Commit your changes** with a message referencing the story id
{% endif %}7. **Append learnings** to `{{ progress_path }}`, one per line in the form
   `[<UTC timestamp>] [Iter <current iteration>] [LEARNING] <what you learned>`
   - patterns found, gotchas, anything the next iteration should know
8. **Update the backlog**: set `passes: true` on the finished story. If
   you could not proceed (for example an unresolvable merge conflict), set
   `blocked: true` and record why in the story's `notes` field instead.
   Never delete stories.
9. **Signal completion**: if all stories that are not blocked now have
   `passes: true`, output: `{{ promise }}`

Now read the backlog and journal, then begin.
"#;

const AGENT_MD_TEMPLATE: &str = r#"# {{ project }}

{{ description }}

## How this repository is worked on

This project is driven by ralph, an autonomous agent loop. Each iteration
starts a fresh agent with no memory; everything worth knowing must live in
a file:

- `{{ prd_path }}` - the backlog of user stories and their status
- `{{ progress_path }}` - journal of learnings across iterations
- `{{ skills_dir }}` - reusable skills distilled from past runs
- `.ralph/prompt.md` - the instructions each iteration receives

## Conventions

- One story per iteration, smallest change that satisfies the criteria
- Tests accompany every story before it is marked passing
- Record anything surprising in the progress journal
"#;

const SKILL_SEED_TEMPLATE: &str = r#"---
name: using-skills
description: How skill files work and when to add one
date: {{ date }}
---

Skill files capture reusable know-how so later iterations (and later
projects) stop rediscovering it. Each file in this directory is one skill:
YAML frontmatter with a name and one-line description, then the skill
itself in plain markdown.

Add a skill when you learn something that will apply beyond the current
story - a build quirk, a testing recipe, a convention this codebase
follows. Keep each one short and specific.
"#;

const COMPOUND_PROMPT_TEMPLATE: &str = r#"You are reviewing a run of an autonomous agent loop on **{{ project }}**.

The progress journal recorded these learnings:

{{ learnings }}

Distill them into at most three reusable skills. For each skill output a
markdown section with:

- a `## ` heading naming the skill in a few words
- one paragraph stating the skill precisely enough that a fresh agent can
  apply it without any other context

Skip learnings that were one-off observations. Output only the markdown
sections, nothing else.
"#;

const LAUNCHD_PLIST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{{ label }}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{{ program }}</string>
        <string>run</string>
    </array>
    <key>WorkingDirectory</key>
    <string>{{ working_dir }}</string>
    <key>StartInterval</key>
    <integer>{{ interval_secs }}</integer>
    <key>StandardOutPath</key>
    <string>{{ log_path }}</string>
    <key>StandardErrorPath</key>
    <string>{{ log_path }}</string>
</dict>
</plist>
"#;

const CRON_LINE_TEMPLATE: &str =
    r#"{{ schedule }} cd {{ working_dir }} && {{ program }} run >> {{ log_path }} 2>&1"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_template_resolves() {
        for name in list_builtin_templates() {
            assert!(get_builtin_template(name).is_some(), "missing: {}", name);
        }
    }

    #[test]
    fn test_unknown_template_is_none() {
        assert!(get_builtin_template("nonexistent").is_none());
    }

    #[test]
    fn test_prompt_template_mentions_core_protocol() {
        let content = get_builtin_template(PROMPT_MD).unwrap();
        assert!(content.contains("{{ prd_path }}"));
        assert!(content.contains("{{ progress_path }}"));
        assert!(content.contains("{{ promise }}"));
        assert!(content.contains("passes"));
        assert!(content.contains("dependsOn"));
    }

    // A blocked story never passes; the completion rule must only cover
    // stories that are not blocked.
    #[test]
    fn test_prompt_completion_rule_excludes_blocked_stories() {
        let content = get_builtin_template(PROMPT_MD).unwrap();
        assert!(content.contains("if all stories that are not blocked now have"));
        assert!(!content.contains("if ALL stories"));
    }

    #[test]
    fn test_plist_template_is_well_formed() {
        let content = get_builtin_template(LAUNCHD_PLIST).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.contains("{{ label }}"));
        assert!(content.contains("{{ interval_secs }}"));
    }
}
