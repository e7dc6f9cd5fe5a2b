//! Which Inbox entries are candidates for transfer

use std::ffi::OsStr;

/// `true` for dotfiles (`.DS_Store`, `.partial`, ...).
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.as_encoded_bytes().first() == Some(&b'.')
}

/// `true` unless the name follows the hidden (`.`) or editor temp-file (`~`)
/// convention. Such entries are never transferred.
pub fn is_candidate_name(name: &OsStr) -> bool {
    !matches!(
        name.as_encoded_bytes().first().copied(),
        None | Some(b'.') | Some(b'~')
    )
}
