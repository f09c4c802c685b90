use crate::decision::{AccessDecision, CallSite, Denial, Verdict};
use crate::ports::{CancellationSignal, SymbolTable};
use friends_types::diagnostic::Diagnostic;
use friends_types::report::ReportSummary;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub enabled: bool,
    /// Glob patterns over document paths; matching call sites are skipped.
    pub exclude: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid exclude pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("analysis cancelled after {completed} call sites")]
pub struct Cancelled {
    pub completed: u64,
}

/// Result of analyzing a batch of call sites.
#[derive(Debug, Clone)]
pub struct Analysis<T, M> {
    /// Denied calls in deterministic order (path, offset, expression).
    pub denials: Vec<Denial<T, M>>,
    pub summary: ReportSummary,
}

impl<T, M> Default for Analysis<T, M> {
    fn default() -> Self {
        Self {
            denials: Vec::new(),
            summary: ReportSummary::default(),
        }
    }
}

impl<T, M> Analysis<T, M> {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.denials.iter().map(|d| d.diagnostic.clone()).collect()
    }

    pub fn merge(&mut self, other: Analysis<T, M>) {
        self.summary.merge(&other.summary);
        self.denials.extend(other.denials);
        self.sort();
    }

    fn sort(&mut self) {
        self.denials.sort_by(|a, b| {
            let (la, lb) = (&a.diagnostic.location, &b.diagnostic.location);
            la.path
                .cmp(&lb.path)
                .then(la.span.cmp(&lb.span))
                .then(a.diagnostic.arguments.cmp(&b.diagnostic.arguments))
        });
    }
}

/// Host-side driver: runs [`AccessDecision`] over a batch of call sites.
pub struct Analyzer<'h, H: ?Sized> {
    decision: AccessDecision<'h, H>,
    exclude: Vec<glob::Pattern>,
    enabled: bool,
}

impl<'h, H: SymbolTable + ?Sized> Analyzer<'h, H> {
    pub fn new(host: &'h H, config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let exclude = config
            .exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| AnalyzerError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            decision: AccessDecision::new(host),
            exclude,
            enabled: config.enabled,
        })
    }

    pub fn decision(&self) -> AccessDecision<'h, H> {
        self.decision
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(path))
    }

    /// Evaluate `sites` in order, polling `cancel` before each one.
    pub fn analyze<C: CancellationSignal + ?Sized>(
        &self,
        sites: &[CallSite<H::Type, H::Method>],
        cancel: &C,
    ) -> Result<Analysis<H::Type, H::Method>, Cancelled> {
        let mut analysis = Analysis::default();

        for site in sites {
            if cancel.is_cancelled() {
                debug!(completed = analysis.summary.call_sites, "analysis cancelled");
                return Err(Cancelled {
                    completed: analysis.summary.call_sites,
                });
            }

            analysis.summary.call_sites += 1;
            if !self.enabled || self.is_excluded(site.location.path.as_str()) {
                analysis.summary.skipped += 1;
                continue;
            }

            match self.decision.evaluate(site) {
                Verdict::Allow => analysis.summary.allowed += 1,
                Verdict::Inconclusive(_) => analysis.summary.inconclusive += 1,
                Verdict::Deny(denial) => {
                    analysis.summary.denied += 1;
                    analysis.denials.push(denial);
                }
            }
        }

        analysis.sort();
        Ok(analysis)
    }

    /// Like [`Analyzer::analyze`], split into chunks on a rayon pool of `jobs` threads.
    pub fn analyze_parallel<C>(
        &self,
        sites: &[CallSite<H::Type, H::Method>],
        jobs: usize,
        cancel: &C,
    ) -> Result<Analysis<H::Type, H::Method>, Cancelled>
    where
        H: Sync,
        H::Type: Send + Sync,
        H::Method: Send + Sync,
        C: CancellationSignal + Sync + ?Sized,
    {
        if jobs <= 1 || sites.len() < 2 {
            return self.analyze(sites, cancel);
        }

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool,
            Err(e) => {
                debug!(error = %e, "thread pool unavailable; analyzing sequentially");
                return self.analyze(sites, cancel);
            }
        };

        let chunk_size = sites.len().div_ceil(jobs);
        let results: Vec<Result<Analysis<H::Type, H::Method>, Cancelled>> = pool.install(|| {
            sites
                .par_chunks(chunk_size)
                .map(|chunk| self.analyze(chunk, cancel))
                .collect()
        });

        let mut merged = Analysis::default();
        let mut cancelled = false;
        let mut completed = 0u64;
        for result in results {
            match result {
                Ok(analysis) => {
                    completed += analysis.summary.call_sites;
                    merged.merge(analysis);
                }
                Err(c) => {
                    cancelled = true;
                    completed += c.completed;
                }
            }
        }

        if cancelled {
            return Err(Cancelled { completed });
        }
        Ok(merged)
    }
}
