//! Build orchestration.
//!
//! A build is a linear state machine:
//!
//! ```text
//! Idle → Loading → Indexing → Rendering → Assembling → Done
//!           │          │           │            │
//!           └──────────┴───────────┴────────────┴──→ Failed
//! ```
//!
//! Any fatal error moves the pipeline to [`Phase::Failed`] and is returned as
//! a [`BuildError`]; its message stays available from [`Pipeline::failure`].
//! Warnings are kept on the pipeline as each phase finishes, so they survive
//! a later failure. Nothing touches the output directory until the site is
//! fully assembled; [`publish`] then writes it into a staging directory and
//! swaps it in, so a failed build leaves no partial output behind.
//!
//! Rendering is the only parallel stage. Each document is rendered on the
//! rayon pool; progress is reported through an optional `mpsc` channel so the
//! CLI can print from a single thread.

use crate::assemble::{AssembleError, Site, assemble};
use crate::config::{ConfigError, ProcessingConfig, SiteConfig, SiteVars, effective_threads};
use crate::diagnostics::Warning;
use crate::index::{CollectionIndex, index};
use crate::load::{DocumentSet, LoadError, load};
use crate::render::render;
use crate::types::{Document, RenderedPage, document_path};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("Failed to publish site: {0}")]
    Publish(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Indexing,
    Rendering,
    Assembling,
    Done,
    Failed,
}

/// Progress reported while a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    PhaseEntered(Phase),
    DocumentRendered {
        id: String,
        title: String,
        unresolved: usize,
    },
}

/// Everything a successful build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub documents: DocumentSet,
    pub index: CollectionIndex,
    pub site: Site,
    pub warnings: Vec<Warning>,
}

pub struct Pipeline<'a> {
    source: &'a Path,
    config: &'a SiteConfig,
    skip: Vec<PathBuf>,
    events: Option<Sender<BuildEvent>>,
    transitions: Vec<Phase>,
    warnings: Vec<Warning>,
    failure: Option<String>,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a Path, config: &'a SiteConfig) -> Self {
        Self {
            source,
            config,
            skip: Vec::new(),
            events: None,
            transitions: vec![Phase::Idle],
            warnings: Vec::new(),
            failure: None,
        }
    }

    /// Never read sources below `path` (the output directory, typically).
    pub fn skip(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip.push(path.into());
        self
    }

    pub fn with_events(mut self, events: Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn phase(&self) -> Phase {
        self.transitions.last().copied().unwrap_or(Phase::Idle)
    }

    /// Every phase entered so far, starting with `Idle`.
    pub fn transitions(&self) -> &[Phase] {
        &self.transitions
    }

    /// Warnings collected by the phases that finished, in phase order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Message of the error that moved the pipeline to [`Phase::Failed`].
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Run the build to completion. The event channel, if any, is closed
    /// when this returns.
    pub fn run(&mut self) -> Result<BuildOutcome, BuildError> {
        self.transitions.truncate(1);
        self.warnings.clear();
        self.failure = None;
        let result = self.execute();
        match &result {
            Ok(_) => self.enter(Phase::Done),
            Err(e) => {
                self.failure = Some(e.to_string());
                self.enter(Phase::Failed);
            }
        }
        self.events = None;
        result
    }

    fn execute(&mut self) -> Result<BuildOutcome, BuildError> {
        self.enter(Phase::Loading);
        let loaded = load(self.source, self.config, &self.skip)?;
        self.warnings.extend(loaded.warnings);
        let documents = loaded.documents;

        self.enter(Phase::Indexing);
        let index = index(&documents);
        self.warnings.extend(index.warnings().iter().cloned());

        self.enter(Phase::Rendering);
        let vars = self.config.vars();
        let (pages, unresolved) = render_all(&documents, &index, &vars, self.events.clone());
        self.warnings.extend(unresolved);

        self.enter(Phase::Assembling);
        let site = assemble(&documents, &index, pages, self.config)?;

        Ok(BuildOutcome {
            documents,
            index,
            site,
            warnings: self.warnings.clone(),
        })
    }

    fn enter(&mut self, phase: Phase) {
        self.transitions.push(phase);
        if let Some(tx) = &self.events {
            tx.send(BuildEvent::PhaseEntered(phase)).ok();
        }
    }
}

/// Render every document on the rayon pool.
///
/// Returns pages in identity order, each carrying its collection links, and
/// one [`Warning::UnresolvedDirective`] per directive left in a body.
pub fn render_all(
    documents: &DocumentSet,
    index: &CollectionIndex,
    vars: &SiteVars,
    events: Option<Sender<BuildEvent>>,
) -> (Vec<RenderedPage>, Vec<Warning>) {
    let sources: Vec<&Document> = documents.iter().collect();

    let rendered: Vec<_> = sources
        .par_iter()
        .map_with(events, |events, document| {
            let out = render(&document.body, vars);
            if let Some(tx) = events {
                tx.send(BuildEvent::DocumentRendered {
                    id: document.id.clone(),
                    title: document.title.clone(),
                    unresolved: out.unresolved.len(),
                })
                .ok();
            }
            let page = RenderedPage {
                id: document.id.clone(),
                path: document_path(&document.id),
                html: out.html,
                previous: index.previous(&document.id).map(str::to_string),
                next: index.next(&document.id).map(str::to_string),
            };
            (page, out.unresolved)
        })
        .collect();

    let mut pages = Vec::with_capacity(rendered.len());
    let mut warnings = Vec::new();
    for (page, unresolved) in rendered {
        warnings.extend(
            unresolved
                .into_iter()
                .map(|u| Warning::UnresolvedDirective {
                    document: page.id.clone(),
                    line: u.line,
                    directive: u.directive,
                }),
        );
        pages.push(page);
    }
    (pages, warnings)
}

/// Write the site to `output`, replacing whatever was there.
///
/// Units are written into a staging sibling first; the old output is only
/// removed once every unit is on disk.
pub fn publish(site: &Site, output: &Path) -> std::io::Result<()> {
    let staging = staging_path(output);
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }

    if let Err(e) = write_units(site, &staging) {
        fs::remove_dir_all(&staging).ok();
        return Err(e);
    }

    if output.exists() {
        fs::remove_dir_all(output)?;
    }
    fs::rename(&staging, output).inspect_err(|_| {
        fs::remove_dir_all(&staging).ok();
    })
}

fn write_units(site: &Site, root: &Path) -> std::io::Result<()> {
    fs::create_dir_all(root)?;
    for unit in &site.units {
        let path = root.join(&unit.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &unit.contents)?;
    }
    Ok(())
}

fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string());
    output.with_file_name(format!(".{name}.staging"))
}

/// Load, index, render, assemble and publish in one call.
pub fn build(
    source: &Path,
    output: &Path,
    config: &SiteConfig,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildOutcome, BuildError> {
    let mut pipeline = Pipeline::new(source, config).skip(output);
    if let Some(tx) = events {
        pipeline = pipeline.with_events(tx);
    }
    let outcome = pipeline.run()?;
    publish(&outcome.site, output)?;
    Ok(outcome)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: users can constrain down, not up.
pub fn init_thread_pool(processing: &ProcessingConfig) {
    let threads = effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
