use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::app::{AppContext, FeedreaderError, Result};
use crate::config::OutputOptions;
use crate::domain::{EntryState, FeedDoc, UrlQueue};
use crate::fetcher::ResponseBuffer;
use crate::http::{check_response, parse_response, Decision, DocType};
use crate::url::{ParsedUrl, SourceType, DEFAULT_SCHEME};
use crate::PROGNAME;

/// How the queue was given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// A single URL argument: the first failure ends the run.
    Single,
    /// A feed file: every URL is attempted and documents are separated by
    /// a blank line.
    FeedFile,
}

impl RunMode {
    fn fail_fast(self) -> bool {
        self == RunMode::Single
    }
}

/// Load the URL list of a feed file.
pub fn load_feedfile(path: &Path) -> Result<UrlQueue> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FeedreaderError::File(format!(
            "Unable to open file on path '{}'! ({})",
            path.display(),
            e
        ))
    })?;
    Ok(UrlQueue::from_feedfile(&content))
}

/// Process every entry of `queue` in order, printing parsed feeds to `out`.
///
/// Returns the exit code of the first failed entry, or 0.
pub async fn read_feeds<W: Write>(
    ctx: &AppContext,
    queue: &mut UrlQueue,
    mode: RunMode,
    out: &mut W,
) -> u8 {
    let mut buf = ResponseBuffer::new();
    let mut index = 0;

    while index < queue.len() {
        if let Err(err) = process_entry(ctx, queue, index, &mut buf, mode, out).await {
            report_error(&err);
            if let Some(entry) = queue.get_mut(index) {
                entry.state = EntryState::Failed(err);
            }
            if mode.fail_fast() {
                break;
            }
        }
        index += 1;
    }

    queue.exit_code()
}

fn set_state(queue: &mut UrlQueue, index: usize, state: EntryState) {
    if let Some(entry) = queue.get_mut(index) {
        entry.state = state;
    }
}

async fn process_entry<W: Write>(
    ctx: &AppContext,
    queue: &mut UrlQueue,
    index: usize,
    buf: &mut ResponseBuffer,
    mode: RunMode,
    out: &mut W,
) -> Result<()> {
    let raw = match queue.get(index) {
        Some(entry) => entry.url.clone(),
        None => return Ok(()),
    };
    debug!(index, url = %raw, "processing queue entry");

    let url = ParsedUrl::parse(&raw, DEFAULT_SCHEME)?;
    set_state(queue, index, EntryState::UrlParsed);

    buf.clear();
    ctx.fetcher.load(&url, buf).await?;
    set_state(queue, index, EntryState::Loaded);

    let bytes = buf.as_bytes();
    let display = url.to_string();

    let (body, doc_type) = if url.source == SourceType::File {
        (bytes, DocType::Xml)
    } else {
        let resp = parse_response(bytes, &display)?;
        set_state(queue, index, EntryState::ResponseParsed);

        let decision = check_response(&resp, bytes, queue, index, &url, ctx.settings.check_mime)?;
        if decision == Decision::Redirect {
            set_state(queue, index, EntryState::Redirected);
            return Ok(());
        }
        (resp.body(bytes), resp.doc_type)
    };

    let doc = ctx.normalizer.normalize(body, doc_type, &display)?;
    print_feed_doc(&doc, &ctx.settings.output, out).map_err(output_error)?;
    if mode == RunMode::FeedFile {
        writeln!(out).map_err(output_error)?;
    }

    set_state(queue, index, EntryState::Succeeded);
    Ok(())
}

fn output_error(e: std::io::Error) -> FeedreaderError {
    FeedreaderError::Internal(format!("Unable to write output! ({})", e))
}

/// Print the title line of `doc` and one block per entry.
pub fn print_feed_doc<W: Write>(
    doc: &FeedDoc,
    options: &OutputOptions,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(out, "*** {} ***", doc.display_title())?;

    for entry in &doc.entries {
        writeln!(out, "{}", entry.display_title())?;

        if options.show_author {
            if let Some(author) = &entry.author {
                writeln!(out, "Author: {}", author)?;
            }
        }
        if options.show_url {
            if let Some(link) = &entry.link {
                writeln!(out, "URL: {}", link)?;
            }
        }
        if options.show_time {
            if let Some(updated) = &entry.updated {
                writeln!(out, "Updated: {}", doc.format.format_date(updated))?;
            }
        }
        if options.any() {
            writeln!(out)?;
        }
    }

    Ok(())
}

/// Print a failure as `feedreader: <kind>: <detail>` on stderr.
pub fn report_error(err: &FeedreaderError) {
    eprintln!("{}: {}", PROGNAME, err);
}
