// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job names for JPEG print jobs: `<id>[-<file name>].jpg`, where `<id>` is
// four random base-36 characters.

use uuid::Uuid;

const ID_LEN: usize = 4;
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Four random lowercase base-36 characters.
pub fn random_id() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        id.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    id
}

/// Job name for a JPEG upload.  An empty `file_name` counts as absent.
pub fn jpeg_job_name(file_name: Option<&str>) -> String {
    let id = random_id();
    match file_name.map(str::trim).filter(|f| !f.is_empty()) {
        Some(file) => format!("{id}-{file}.jpg"),
        None => format!("{id}.jpg"),
    }
}
