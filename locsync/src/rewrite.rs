//! Writing reconciled units back into their document.
//!
//! Rewriting is split in two: [`plan`] looks at the parsed document and the
//! units and describes every byte splice needed, without touching anything;
//! [`RewritePlan::apply`] performs those splices. Bytes outside the splices
//! are never changed, and a second pass over the result plans nothing.

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::Write,
    ops::Range,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::Error,
    file::LocalizationFile,
    formats::{
        AndroidStringsDocument, FormatType, Node, PayloadSpan, ResxDocument, SourceText,
        XliffDocument,
    },
    traits::Document,
    types::TranslationUnit,
};

/// Default text of the comment placed before appended units.
pub const DEFAULT_MARKER: &str = "IMPORTED FROM REMOTE TRANSLATIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    pub marker: String,
    /// Plan only; never write the file.
    pub dry_run: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        RewriteOptions {
            marker: DEFAULT_MARKER.to_string(),
            dry_run: false,
        }
    }
}

/// One replacement of a byte range of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub text: String,
}

/// Every change a rewrite pass will make, computed before any mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    /// Existing nodes whose payload changes.
    pub updated: Vec<String>,
    /// Units added at the end of the document.
    pub appended: Vec<String>,
    /// Whether the marker comment precedes the appended units.
    pub marker: bool,
    splices: Vec<Splice>,
}

impl RewritePlan {
    pub fn is_empty(&self) -> bool {
        self.splices.is_empty()
    }

    pub fn splices(&self) -> &[Splice] {
        &self.splices
    }

    /// Applies the planned splices to the text the plan was made from.
    pub fn apply(&self, content: &str) -> String {
        let mut splices: Vec<&Splice> = self.splices.iter().collect();
        splices.sort_by(|a, b| b.range.start.cmp(&a.range.start));
        let mut out = content.to_string();
        for splice in splices {
            out.replace_range(splice.range.clone(), &splice.text);
        }
        out
    }
}

/// What a rewrite did to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub updated: Vec<String>,
    pub appended: Vec<String>,
    pub marker: bool,
    pub written: bool,
}

/// Plans the splices that bring `content` in line with `units`.
///
/// - A unit with a node is rewritten only when its target text differs from
///   the decoded payload on disk; untranslated units never blank a node.
/// - A translated unit without a node is appended, if the document can grow.
/// - The marker is planned only when at least one unit is appended.
pub fn plan<'a, D, I>(document: &D, content: &str, units: I, options: &RewriteOptions) -> RewritePlan
where
    D: Document,
    I: IntoIterator<Item = &'a TranslationUnit>,
{
    let escaping = document.escaping();
    let nodes: HashMap<&str, &Node> = document
        .nodes()
        .iter()
        .map(|n| (n.identifier.as_str(), n))
        .collect();
    let excluded: HashSet<&str> = document.excluded().iter().map(String::as_str).collect();

    let mut plan = RewritePlan::default();
    let mut seen = HashSet::new();
    let mut additions = Vec::new();

    for unit in units {
        let id = unit.identifier();
        if excluded.contains(id) || !seen.insert(id) || !unit.is_translated() {
            continue;
        }
        match nodes.get(id) {
            Some(node) => {
                let raw = node.raw(content);
                let encoded = escaping.encode(&unit.target_text);
                if raw == encoded || escaping.matches(raw, &unit.target_text) {
                    continue;
                }
                let splice = match &node.payload {
                    PayloadSpan::Content(range) => Splice {
                        range: range.clone(),
                        text: encoded,
                    },
                    PayloadSpan::Missing {
                        replace,
                        open,
                        close,
                    } => Splice {
                        range: replace.clone(),
                        text: format!("{}{}{}", open, encoded, close),
                    },
                };
                plan.updated.push(id.to_string());
                plan.splices.push(splice);
            }
            None if document.append_point().is_some() => {
                additions.push((id, escaping.encode(&unit.target_text)));
            }
            None => debug!(id, "no node and the document cannot grow, skipping"),
        }
    }

    if let Some(point) = document.append_point()
        && !additions.is_empty()
    {
        let mut block = String::new();
        if point.needs_newline {
            block.push_str(point.newline);
        }
        block.push_str(&point.render_marker(&options.marker));
        for (id, payload) in &additions {
            block.push_str(&point.render_unit(id, payload));
            plan.appended.push(id.to_string());
        }
        plan.marker = true;
        plan.splices.push(match &point.expand_root {
            Some(root) => Splice {
                range: root.element.clone(),
                text: format!("{}>{}{}</{}>", root.open_tag, point.newline, block, root.name),
            },
            None => Splice {
                range: point.at..point.at,
                text: block,
            },
        });
    }
    plan
}

/// Parses `content` as `format` and plans the rewrite for `units`.
pub fn plan_for_format<'a, I>(
    format: FormatType,
    content: &str,
    units: I,
    options: &RewriteOptions,
) -> Result<RewritePlan, Error>
where
    I: IntoIterator<Item = &'a TranslationUnit>,
{
    Ok(match format {
        FormatType::AndroidStrings => {
            plan(&AndroidStringsDocument::parse(content)?, content, units, options)
        }
        FormatType::Xliff => plan(&XliffDocument::parse(content)?, content, units, options),
        FormatType::Resx => plan(&ResxDocument::parse(content)?, content, units, options),
    })
}

/// Rewrites the file on disk from its units and untranslated units.
///
/// The file is re-read, planned against and, only when the plan is not
/// empty, replaced atomically.
pub fn rewrite_file(file: &LocalizationFile, options: &RewriteOptions) -> Result<RewriteOutcome, Error> {
    let source = SourceText::read_from(&file.path)?;
    let plan = plan_for_format(file.format, &source.text, file.all_units(), options)?;

    let mut outcome = RewriteOutcome {
        updated: plan.updated.clone(),
        appended: plan.appended.clone(),
        marker: plan.marker,
        written: false,
    };
    if plan.is_empty() {
        debug!(file = %file.path.display(), "nothing to rewrite");
        return Ok(outcome);
    }
    if options.dry_run {
        info!(
            file = %file.path.display(),
            updated = outcome.updated.len(),
            appended = outcome.appended.len(),
            "dry run, not writing"
        );
        return Ok(outcome);
    }

    let rewritten = plan.apply(&source.text);
    atomic_write(&file.path, &source.to_bytes(&rewritten))?;
    outcome.written = true;
    info!(
        file = %file.path.display(),
        updated = outcome.updated.len(),
        appended = outcome.appended.len(),
        "rewrote"
    );
    Ok(outcome)
}

/// Writes `content` to a temporary file next to `path`, syncs it and renames
/// it over `path`. The original permissions are kept.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
