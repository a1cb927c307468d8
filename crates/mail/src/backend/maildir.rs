//! Live adapter over a desktop client's local Maildir++ store
//!
//! Layout: the root directory is the inbox, and every dot-prefixed
//! subdirectory holding a `cur/` directory is a folder (`.A.B` is the
//! folder `A/B`). Messages live in `cur/` and `new/`; a message is read
//! when it sits in `cur/` with the `S` flag in its info suffix.
//!
//! Directory listings are snapshots with an exact length. They are walked
//! in full, and an entry that vanished or does not parse is skipped on
//! its own.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use mail_parser::{Address, MessageParser};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::MailBackend;
use super::walker::{PositionalSource, walk_snapshot};
use crate::error::{MailError, Result};
use crate::models::{EmailAddress, Folder, INBOX, Importance, Message, MessageId, PATH_SEPARATOR};

const CUR: &str = "cur";
const NEW: &str = "new";
const UNKNOWN_SENDER: &str = "unknown@unknown.com";

/// Maildir-backed implementation of MailBackend
pub struct MaildirBackend {
    root: PathBuf,
}

impl MaildirBackend {
    /// Open a Maildir++ root
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(CUR).is_dir() {
            return Err(MailError::invalid_argument(format!(
                "'{}' is not a Maildir directory (missing {}/)",
                root.display(),
                CUR
            )));
        }
        info!("Opened Maildir store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot of (folder path, directory), inbox first, then by path
    fn folder_dirs(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(folder_path) = folder_path_for_dir(&name) else {
                continue;
            };
            if folder_path.eq_ignore_ascii_case(INBOX) {
                continue;
            }
            let dir = entry.path();
            if dir.join(CUR).is_dir() {
                dirs.push((folder_path, dir));
            }
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        dirs.insert(0, (INBOX.to_string(), self.root.clone()));
        Ok(dirs)
    }

    /// Resolve a folder path to its canonical path and directory
    ///
    /// Only paths that `list_folders` reports resolve; `Inbox` matches
    /// case-insensitively.
    fn resolve_folder(&self, folder_path: &str) -> Result<(String, PathBuf)> {
        if folder_path.eq_ignore_ascii_case(INBOX) {
            return Ok((INBOX.to_string(), self.root.clone()));
        }
        self.folder_dirs()?
            .into_iter()
            .find(|(path, _)| path == folder_path)
            .ok_or_else(|| MailError::folder_not_found(folder_path))
    }

    /// Locate a message file by its unique name
    fn find_message(&self, id: &MessageId) -> Result<(String, PathBuf)> {
        for (folder_path, dir) in self.folder_dirs()? {
            let found = message_files(&dir)?
                .into_iter()
                .find(|file| unique_name(file).as_deref() == Some(id.as_str()));
            if let Some(file) = found {
                return Ok((folder_path, file));
            }
        }
        Err(MailError::message_not_found(id.as_str()))
    }
}

impl MailBackend for MaildirBackend {
    fn list_folders(&self) -> Result<Vec<Folder>> {
        let dirs = self.folder_dirs()?;
        let outcome = walk_snapshot(&FolderListing { dirs: &dirs });
        if !outcome.skipped.is_empty() {
            debug!("Folder listing skipped {} folder(s)", outcome.skipped.len());
        }
        info!("Enumerated {} folders", outcome.items.len());
        Ok(outcome.items)
    }

    fn list_messages(&self, folder_path: &str) -> Result<Vec<Message>> {
        let (folder_path, dir) = self.resolve_folder(folder_path)?;
        let files = message_files(&dir)?;
        let outcome = walk_snapshot(&MessageListing {
            folder_path: &folder_path,
            files: &files,
        });
        let unresolved = files.len() - outcome.items.len();
        if unresolved > 0 {
            warn!(
                "{}: {} of {} message(s) could not be read",
                folder_path,
                unresolved,
                files.len()
            );
        }
        Ok(outcome.items)
    }

    fn get_message(&self, id: &MessageId) -> Result<Message> {
        let (folder_path, file) = self.find_message(id)?;
        parse_message_file(&folder_path, &file)
    }

    fn move_message(&self, id: &MessageId, destination: &str) -> Result<()> {
        let (source_path, file) = self.find_message(id)?;
        let (dest_path, dest_dir) = self.resolve_folder(destination)?;
        if source_path == dest_path {
            return Ok(());
        }

        let sub = file
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_owned())
            .unwrap_or_else(|| CUR.into());
        let file_name = file
            .file_name()
            .ok_or_else(|| MailError::message_not_found(id.as_str()))?;
        let target = dest_dir.join(sub).join(file_name);

        fs::rename(&file, &target)?;
        info!("Moved {} from {} to {}", id, source_path, dest_path);
        Ok(())
    }

    fn get_folder_info(&self, folder_path: &str) -> Result<Folder> {
        let (folder_path, dir) = self.resolve_folder(folder_path)?;
        folder_from_dir(&folder_path, &dir)
    }
}

struct FolderListing<'a> {
    dirs: &'a [(String, PathBuf)],
}

impl PositionalSource for FolderListing<'_> {
    type Item = Folder;

    fn reported_len(&self) -> usize {
        self.dirs.len()
    }

    fn fetch(&self, position: usize) -> Result<Folder> {
        let (path, dir) = position
            .checked_sub(1)
            .and_then(|i| self.dirs.get(i))
            .ok_or_else(|| past_end(position))?;
        folder_from_dir(path, dir)
    }
}

struct MessageListing<'a> {
    folder_path: &'a str,
    files: &'a [PathBuf],
}

impl PositionalSource for MessageListing<'_> {
    type Item = Message;

    fn reported_len(&self) -> usize {
        self.files.len()
    }

    fn fetch(&self, position: usize) -> Result<Message> {
        let file = position
            .checked_sub(1)
            .and_then(|i| self.files.get(i))
            .ok_or_else(|| past_end(position))?;
        parse_message_file(self.folder_path, file)
    }
}

fn past_end(position: usize) -> MailError {
    MailError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("no entry at position {}", position),
    ))
}

/// Map a Maildir++ directory name (".Custom.Projects") to a folder path
fn folder_path_for_dir(name: &str) -> Option<String> {
    let rest = name.strip_prefix('.')?;
    if rest.is_empty() || rest.starts_with('.') || rest.split('.').any(str::is_empty) {
        return None;
    }
    Some(rest.replace('.', &PATH_SEPARATOR.to_string()))
}

/// Message files in `cur/` and `new/`, ordered by file name
fn message_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for sub in [CUR, NEW] {
        let sub_dir = dir.join(sub);
        if !sub_dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&sub_dir)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type()?.is_dir() {
                continue;
            }
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// The Maildir unique name: the file name up to the info separator
fn unique_name(file: &Path) -> Option<String> {
    let name = file.file_name()?.to_str()?;
    name.split(':').next().map(str::to_string)
}

fn is_read(file: &Path) -> bool {
    let in_cur = file
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|s| s == CUR);
    let flags = file
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split_once(":2,"))
        .map(|(_, flags)| flags)
        .unwrap_or_default();
    in_cur && flags.contains('S')
}

fn folder_from_dir(folder_path: &str, dir: &Path) -> Result<Folder> {
    let files = message_files(dir)?;
    let unread = files.iter().filter(|f| !is_read(f)).count();
    Folder::new(
        folder_path,
        u32::try_from(files.len()).unwrap_or(u32::MAX),
        u32::try_from(unread).unwrap_or(u32::MAX),
    )
}

fn parse_message_file(folder_path: &str, file: &Path) -> Result<Message> {
    let raw = fs::read(file)?;
    let parsed = MessageParser::default()
        .parse(&raw)
        .filter(|m| !m.headers().is_empty())
        .ok_or_else(|| {
            MailError::validation(format!("'{}' is not a parseable message", file.display()))
        })?;
    let id = unique_name(file)
        .ok_or_else(|| MailError::validation(format!("'{}' has no usable name", file.display())))?;

    let from = parsed
        .from()
        .and_then(|a| addresses(Some(a)).into_iter().next())
        .unwrap_or_else(|| EmailAddress::new(UNKNOWN_SENDER));

    let received_at = parsed
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .or_else(|| modified_at(file))
        .unwrap_or_else(Utc::now);

    let importance = parsed
        .headers()
        .iter()
        .find_map(|h| {
            let value = h.value().as_text()?;
            match h.name() {
                n if n.eq_ignore_ascii_case("Importance") => importance_header(value),
                n if n.eq_ignore_ascii_case("X-Priority") => priority_header(value),
                _ => None,
            }
        })
        .unwrap_or_default();

    Message::builder(id, folder_path)
        .from(from)
        .to(addresses(parsed.to()))
        .cc(addresses(parsed.cc()))
        .subject(parsed.subject().unwrap_or_default())
        .body(parsed.body_text(0).map(|b| b.into_owned()).unwrap_or_default())
        .received_at(received_at)
        .attachments(u32::try_from(parsed.attachment_count()).unwrap_or(u32::MAX))
        .read(is_read(file))
        .importance(importance)
        .build()
}

/// Valid addresses from a header, dropping unusable entries
fn addresses(address: Option<&Address<'_>>) -> Vec<EmailAddress> {
    let Some(address) = address else {
        return Vec::new();
    };
    address
        .iter()
        .filter_map(|addr| {
            let email = addr.address()?;
            let parsed = match addr.name() {
                Some(name) if !name.trim().is_empty() => EmailAddress::with_name(name.trim(), email),
                _ => EmailAddress::new(email),
            };
            parsed.is_valid().then_some(parsed)
        })
        .collect()
}

fn importance_header(value: &str) -> Option<Importance> {
    value.parse().ok()
}

/// X-Priority: 1-2 high, 3 normal, 4-5 low; trailing text ignored
fn priority_header(value: &str) -> Option<Importance> {
    match value.trim().chars().next()? {
        '1' | '2' => Some(Importance::High),
        '3' => Some(Importance::Normal),
        '4' | '5' => Some(Importance::Low),
        _ => None,
    }
}

fn modified_at(file: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(file)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
