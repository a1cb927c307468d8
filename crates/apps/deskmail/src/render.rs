//! Text rendering for command output
//!
//! Every function returns lines instead of printing so output can be
//! checked in tests.

use mail::models::{EmailAddress, Folder, Message};
use mail::{AuditEntry, PageInfo};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn counts(folder: &Folder) -> String {
    if folder.unread_count > 0 {
        format!("{} messages, {} unread", folder.email_count, folder.unread_count)
    } else {
        format!("{} messages", folder.email_count)
    }
}

/// Root folders first, then nested folders grouped under their parent path
pub fn folder_tree(folders: &[Folder]) -> Vec<String> {
    let roots: Vec<&Folder> = folders.iter().filter(|f| !f.is_nested()).collect();
    let mut groups: Vec<(&str, Vec<&Folder>)> = Vec::new();
    for folder in folders {
        let Some(parent) = folder.parent_path() else {
            continue;
        };
        match groups.iter_mut().find(|(p, _)| *p == parent) {
            Some((_, children)) => children.push(folder),
            None => groups.push((parent, vec![folder])),
        }
    }

    let top_level = roots.len() + groups.len();
    let mut lines = Vec::new();
    let mut index = 0;
    let branch = |index: usize| if index + 1 == top_level { "└──" } else { "├──" };

    for folder in roots {
        lines.push(format!("{} {} ({})", branch(index), folder.name, counts(folder)));
        index += 1;
    }
    for (parent, children) in groups {
        let last_group = index + 1 == top_level;
        lines.push(format!("{} {}/", branch(index), parent));
        let indent = if last_group { "    " } else { "│   " };
        for (i, child) in children.iter().enumerate() {
            let connector = if i + 1 == children.len() { "└──" } else { "├──" };
            lines.push(format!("{}{} {} ({})", indent, connector, child.name, counts(child)));
        }
        index += 1;
    }
    lines
}

/// One line per folder with its full path
pub fn folder_flat(folders: &[Folder]) -> Vec<String> {
    folders
        .iter()
        .map(|f| format!("  {} ({})", f.path, counts(f)))
        .collect()
}

pub fn page_header(info: &PageInfo) -> String {
    format!(
        "Page {} of {} ({} messages)",
        info.current_page, info.total_pages, info.total_items
    )
}

/// Summary block for one message in a listing, numbered from `number`
pub fn message_summary(number: usize, message: &Message) -> Vec<String> {
    let status = if message.is_read { "[READ]" } else { "[UNREAD]" };
    let mut lines = vec![
        format!("{}. [{}] {} Subject: {}", number, message.id, status, message.subject),
        format!("   From: {}", message.from.display()),
        format!("   Date: {}", message.received_at.format(DATE_FORMAT)),
    ];
    if message.has_attachments {
        lines.push(format!("   Attachments: {}", message.attachment_count));
    }
    lines.push(String::new());
    lines
}

pub fn large_result_warning(total: usize) -> Vec<String> {
    vec![
        format!("Warning: Large result set detected ({} emails)", total),
        "Streaming results to prevent memory issues...".to_string(),
        String::new(),
    ]
}

/// Full view of a single message
pub fn message_detail(message: &Message) -> Vec<String> {
    let join = |list: &[EmailAddress]| {
        list.iter()
            .map(|a| a.display())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = vec![
        format!("ID: {}", message.id),
        format!("Folder: {}", message.folder_path),
        format!("Subject: {}", message.subject),
        format!("From: {}", message.from.display()),
        format!("To: {}", join(&message.to)),
    ];
    if !message.cc.is_empty() {
        lines.push(format!("Cc: {}", join(&message.cc)));
    }
    lines.extend([
        format!("Date: {}", message.received_at.format(DATE_FORMAT)),
        format!("Status: {}", if message.is_read { "Read" } else { "Unread" }),
        format!("Importance: {}", message.importance),
        format!("Attachments: {}", message.attachment_count),
        String::new(),
    ]);
    lines.extend(message.body.lines().map(str::to_string));
    lines
}

pub fn audit_entry(entry: &AuditEntry) -> String {
    format!(
        "{} {} {} results={} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.user,
        entry.operation,
        entry.result_count,
        entry.details
    )
}
