//! Identifier generation.
//!
//! Ids are short random codes prefixed with a one-letter type tag. Requirement
//! and task ids additionally start with the id of their project, so the owning
//! project can be read back from any child id:
//!
//! - project: `P` + 3 chars, e.g. `Pa7Q`
//! - requirement: project id + `R` + 3 chars, e.g. `Pa7QR0xz`
//! - task: project id + `T` + 6 chars, e.g. `Pa7QTk29Bc1`

use rand::Rng;

pub const PROJECT_TAG: char = 'P';
pub const REQUIREMENT_TAG: char = 'R';
pub const TASK_TAG: char = 'T';

pub const PROJECT_BODY_LEN: usize = 3;
pub const REQUIREMENT_BODY_LEN: usize = 3;
pub const TASK_BODY_LEN: usize = 6;

/// Length of a project id, and therefore of the prefix of every child id.
pub const PROJECT_ID_LEN: usize = 1 + PROJECT_BODY_LEN;

/// Random body alphabet. The uppercase type tags are left out so a tag can
/// never appear inside a body.
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOQSUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generates `prefix` followed by `body_len` random characters, retrying until
/// `is_taken` reports the candidate as free.
pub fn generate_id(prefix: &str, body_len: usize, is_taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::rng();
    loop {
        let mut candidate = String::with_capacity(prefix.len() + body_len);
        candidate.push_str(prefix);
        for _ in 0..body_len {
            candidate.push(ALPHABET[rng.random_range(0..ALPHABET.len())] as char);
        }
        if !is_taken(&candidate) {
            return candidate;
        }
    }
}

fn is_body_char(c: char) -> bool {
    c.is_ascii() && ALPHABET.contains(&(c as u8))
}

pub fn is_project_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next() == Some(PROJECT_TAG)
        && id.len() == PROJECT_ID_LEN
        && chars.all(is_body_char)
}

/// The id of the project that owns `id`, if `id` starts with one.
pub fn project_prefix(id: &str) -> Option<&str> {
    id.get(..PROJECT_ID_LEN).filter(|p| is_project_id(p))
}

/// Whether `id` is a child id of type `tag` belonging to `project_id`.
pub fn is_child_of(id: &str, project_id: &str, tag: char) -> bool {
    project_prefix(id) == Some(project_id) && id[PROJECT_ID_LEN..].starts_with(tag)
}
