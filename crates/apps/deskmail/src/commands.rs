//! Command execution
//!
//! Wires configuration, backend, audit log and the result pipeline
//! together for each subcommand. Output goes to a caller-supplied writer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

use mail::query::{
    ChunkStream, MemoryProbe, Paginator, ProcessMemory, ResourceGuard, SortOrder, fetch_sorted,
    is_large_result,
};
use mail::search::{FolderScope, SearchFilters, parse_date_expression, parse_query};
use mail::{ActionHandler, AppConfig, AuditLogger, MailBackend, Message, MessageId, create_backend};

use crate::cli::{Command, FilterArgs, FindArgs, ListingArgs};
use crate::render;

/// Everything a command needs, built once per process
pub struct App {
    config: AppConfig,
    backend: Arc<dyn MailBackend>,
    audit: Arc<AuditLogger>,
    actions: ActionHandler,
    memory: Arc<dyn MemoryProbe>,
}

impl App {
    pub fn new(config: AppConfig, backend: Arc<dyn MailBackend>, audit: AuditLogger) -> Self {
        let audit = Arc::new(audit);
        let actions = ActionHandler::new(backend.clone(), audit.clone());
        Self {
            config,
            backend,
            audit,
            actions,
            memory: Arc::new(ProcessMemory),
        }
    }

    /// Replace the memory source sampled while streaming
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory = probe;
        self
    }

    /// Build the backend and audit log described by `config`
    ///
    /// `backend_flag` is the `--backend` value and wins over the config.
    pub fn from_config(config: AppConfig, backend_flag: Option<&str>) -> Result<Self> {
        let kind = config.backend_kind(backend_flag)?;
        let maildir = config.maildir_root();
        let backend: Arc<dyn MailBackend> = Arc::from(create_backend(kind, maildir.as_deref())?);

        let audit = match config.audit_log_path() {
            Some(path) => AuditLogger::new(path, config.audit.enabled),
            None => {
                warn!("No data directory available; audit logging disabled");
                AuditLogger::disabled()
            }
        };
        Ok(Self::new(config, backend, audit))
    }

    pub fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Folders { flat } => self.folders(flat, out),
            Command::Read {
                folder,
                filters,
                listing,
            } => self.read(&folder, &filters, &listing, out),
            Command::Find(args) => self.find(&args, out),
            Command::Move {
                message_id,
                destination,
            } => self.move_message(&message_id, &destination, out),
            Command::Open { message_id } => self.open(&message_id, out),
            Command::Audit { limit } => self.show_audit(limit, out),
        }
    }

    fn folders(&self, flat: bool, out: &mut dyn Write) -> Result<()> {
        let folders = self.backend.list_folders()?;
        self.audit
            .log_operation("folders", json!({ "flat": flat }), folders.len());

        if folders.is_empty() {
            writeln!(out, "No folders found.")?;
            return Ok(());
        }
        let lines = if flat {
            render::folder_flat(&folders)
        } else {
            render::folder_tree(&folders)
        };
        emit(out, lines)
    }

    fn read(
        &self,
        folder: &str,
        filters: &FilterArgs,
        listing: &ListingArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        let scope = FolderScope::Folder(folder.to_string());
        let filters = explicit_filters(filters, Utc::now())?;
        self.list(&scope, &filters, listing, "read", out)
    }

    fn find(&self, args: &FindArgs, out: &mut dyn Write) -> Result<()> {
        let (scope, filters) = find_criteria(args)?;
        self.list(&scope, &filters, &args.listing, "find", out)
    }

    /// Shared search → sort → deliver path for `read` and `find`
    fn list(
        &self,
        scope: &FolderScope,
        filters: &SearchFilters,
        listing: &ListingArgs,
        operation: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        let order = SortOrder::parse(&listing.sort_by, &listing.sort_order)?;
        let messages = fetch_sorted(self.backend.as_ref(), scope, filters, order)?;
        info!("{}: {} message(s) in {}", operation, messages.len(), scope.as_str());

        self.audit.log_filter_operation(
            operation,
            &json!({
                "folder": scope.as_str(),
                "criteria": filters,
                "sort_by": order.field.as_str(),
                "sort_order": order.direction.as_str(),
            }),
            messages.len(),
        );

        if listing.all {
            self.stream(messages, out)
        } else {
            let page_size = listing.limit.unwrap_or(self.config.page_size);
            paginate(messages, page_size, listing.page, out)
        }
    }

    fn stream(&self, messages: Vec<Message>, out: &mut dyn Write) -> Result<()> {
        let total = messages.len();
        if total == 0 {
            writeln!(out, "No messages found.")?;
            return Ok(());
        }
        if is_large_result(total) {
            warn!("Streaming a large result set of {} messages", total);
            emit(out, render::large_result_warning(total))?;
        }

        let guard = ResourceGuard::with_probe(
            self.config.limits.max_memory_mb,
            Box::new(Arc::clone(&self.memory)),
        );
        let chunks = ChunkStream::new(messages, self.config.chunk_size)?.with_guard(guard);
        let mut number = 0;
        for chunk in chunks {
            for message in chunk? {
                number += 1;
                emit(out, render::message_summary(number, &message))?;
            }
            out.flush()?;
        }
        Ok(())
    }

    fn move_message(&self, id: &str, destination: &str, out: &mut dyn Write) -> Result<()> {
        self.actions.move_message(&MessageId::new(id), destination)?;
        writeln!(out, "Moved message {} to {}", id, destination)?;
        Ok(())
    }

    fn open(&self, id: &str, out: &mut dyn Write) -> Result<()> {
        let message = self.actions.open_message(&MessageId::new(id))?;
        emit(out, render::message_detail(&message))
    }

    fn show_audit(&self, limit: usize, out: &mut dyn Write) -> Result<()> {
        if !self.audit.is_enabled() {
            writeln!(out, "Audit logging is disabled.")?;
        }
        let entries = self.audit.entries(limit);
        if entries.is_empty() {
            writeln!(out, "No audit entries found.")?;
            return Ok(());
        }
        emit(out, entries.iter().map(render::audit_entry))
    }
}

/// Folder scope and filters for `find`
///
/// Explicit flags take precedence over the query string; the folder
/// defaults to every folder.
fn find_criteria(args: &FindArgs) -> Result<(FolderScope, SearchFilters)> {
    let now = Utc::now();
    let parsed = args.query.as_deref().map(parse_query).unwrap_or_default();

    let scope = args
        .folder
        .as_deref()
        .map(FolderScope::from)
        .or_else(|| parsed.scope())
        .unwrap_or(FolderScope::All);

    let explicit = explicit_filters(&args.filters, now)?;
    let filters = parsed.to_filters(now)?.merge(explicit);
    Ok((scope, filters))
}

/// Filters given as command-line flags
fn explicit_filters(args: &FilterArgs, now: DateTime<Utc>) -> Result<SearchFilters> {
    let mut filters = SearchFilters::new();
    if let Some(keyword) = &args.keyword {
        filters = filters.keyword(keyword.as_str());
    }
    if let Some(sender) = &args.sender {
        filters = filters.sender(sender.as_str());
    }
    if let Some(since) = &args.since {
        filters = filters.since(parse_date_expression(since, now)?);
    }
    if let Some(until) = &args.until {
        filters = filters.until(parse_date_expression(until, now)?);
    }
    if args.is_unread || args.is_read {
        filters = filters.unread(args.is_unread);
    }
    if args.has_attachments || args.no_attachments {
        filters = filters.attachments(args.has_attachments);
    }
    if let Some(level) = &args.importance {
        filters = filters.importance(level.parse()?);
    }
    for sender in &args.not_sender {
        filters = filters.exclude_sender(sender.as_str());
    }
    for subject in &args.not_subject {
        filters = filters.exclude_subject(subject.as_str());
    }
    Ok(filters)
}

fn paginate(messages: Vec<Message>, page_size: usize, page: usize, out: &mut dyn Write) -> Result<()> {
    let mut paginator = Paginator::new(messages, page_size)?;
    if page != 1 {
        paginator.go_to_page(page)?;
    }

    let info = paginator.page_info();
    writeln!(out, "{}", render::page_header(&info))?;
    writeln!(out)?;

    if info.total_items == 0 {
        writeln!(out, "No messages found.")?;
        return Ok(());
    }

    let first = (info.current_page - 1) * info.page_size + 1;
    for (offset, message) in paginator.current_page().iter().enumerate() {
        emit(out, render::message_summary(first + offset, message))?;
    }
    if info.has_next {
        writeln!(out, "Use --page {} to see more.", info.current_page + 1)?;
    }
    Ok(())
}

fn emit<I>(out: &mut dyn Write, lines: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
