//! Diagnostics produced by validation and resolution.
//!
//! # Role
//!
//! A [`Diagnostic`] locates one problem (qualified name, coordinate, dimension,
//! contributing module). A failed build returns every error-severity
//! diagnostic as a [`DiagnosticSet`]; warnings ride along on a successful
//! [`crate::ModelSpace`] instead.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::build::{BuildOptions, BuildPhase, Strictness};
use crate::coordinate::Coordinate;
use crate::declaration::{DeclarationKey, ModuleId};
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
	Error,
	Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
	DuplicateElement,
	InvalidElementParent,
	DuplicateDeclaration,
	UnresolvedBaseReference,
	CyclicOverride,
	AmbiguousBase,
	ConflictingMember,
	UndeclaredCoordinate,
	IncompleteResolution,
	RedundantMember,
	UnusedElement,
}

impl DiagnosticKind {
	pub const fn severity(self) -> Severity {
		match self {
			Self::RedundantMember | Self::UnusedElement => Severity::Warning,
			_ => Severity::Error,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::DuplicateElement => "duplicate-element",
			Self::InvalidElementParent => "invalid-element-parent",
			Self::DuplicateDeclaration => "duplicate-declaration",
			Self::UnresolvedBaseReference => "unresolved-base-reference",
			Self::CyclicOverride => "cyclic-override",
			Self::AmbiguousBase => "ambiguous-base",
			Self::ConflictingMember => "conflicting-member",
			Self::UndeclaredCoordinate => "undeclared-coordinate",
			Self::IncompleteResolution => "incomplete-resolution",
			Self::RedundantMember => "redundant-member",
			Self::UnusedElement => "unused-element",
		}
	}
}

impl fmt::Display for DiagnosticKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub qualified_name: Option<Arc<str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub coordinate: Option<Coordinate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dimension: Option<Arc<str>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub module: Option<ModuleId>,
	pub message: String,
}

impl Diagnostic {
	pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			qualified_name: None,
			coordinate: None,
			dimension: None,
			module: None,
			message: message.into(),
		}
	}

	pub fn with_key(mut self, key: DeclarationKey) -> Self {
		self.qualified_name = Some(key.name);
		self.coordinate = Some(key.coordinate);
		self
	}

	pub fn with_dimension(mut self, dimension: Arc<str>) -> Self {
		self.dimension = Some(dimension);
		self
	}

	pub fn with_module(mut self, module: ModuleId) -> Self {
		self.module = Some(module);
		self
	}

	pub fn severity(&self) -> Severity {
		self.kind.severity()
	}

	pub fn is_error(&self) -> bool {
		self.severity() == Severity::Error
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let level = match self.severity() {
			Severity::Error => "error",
			Severity::Warning => "warning",
		};
		write!(f, "{level}[{}]: {}", self.kind, self.message)?;
		if let Some(module) = &self.module {
			write!(f, " (module {module})")?;
		}
		Ok(())
	}
}

/// Failure value of a build: every error diagnostic, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSet {
	phase: BuildPhase,
	diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
	pub(crate) fn new(phase: BuildPhase, diagnostics: Vec<Diagnostic>) -> Self {
		Self { phase, diagnostics }
	}

	/// Phase in which the first error surfaced.
	pub fn phase(&self) -> BuildPhase {
		self.phase
	}

	pub fn len(&self) -> usize {
		self.diagnostics.len()
	}

	pub fn is_empty(&self) -> bool {
		self.diagnostics.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
		self.diagnostics.iter()
	}

	pub fn as_slice(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	/// Returns true if any diagnostic has the given kind.
	pub fn contains(&self, kind: DiagnosticKind) -> bool {
		self.diagnostics.iter().any(|d| d.kind == kind)
	}

	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.diagnostics
	}
}

impl fmt::Display for DiagnosticSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "model build failed while {} with {} diagnostic(s)", self.phase, self.diagnostics.len())?;
		for diagnostic in &self.diagnostics {
			write!(f, "\n  {diagnostic}")?;
		}
		Ok(())
	}
}

impl std::error::Error for DiagnosticSet {}

impl IntoIterator for DiagnosticSet {
	type Item = Diagnostic;
	type IntoIter = std::vec::IntoIter<Diagnostic>;

	fn into_iter(self) -> Self::IntoIter {
		self.diagnostics.into_iter()
	}
}

impl<'a> IntoIterator for &'a DiagnosticSet {
	type Item = &'a Diagnostic;
	type IntoIter = std::slice::Iter<'a, Diagnostic>;

	fn into_iter(self) -> Self::IntoIter {
		self.diagnostics.iter()
	}
}

/// Accumulates diagnostics for one build under the configured strictness.
///
/// In strict mode the first error halts collection; later errors are dropped
/// and callers stop at the next [`Collector::halted`] check.
pub(crate) struct Collector {
	strictness: Strictness,
	report_warnings: bool,
	errors: Vec<Diagnostic>,
	warnings: Vec<Diagnostic>,
	failed_names: FxHashSet<Arc<str>>,
}

impl Collector {
	pub(crate) fn new(options: &BuildOptions) -> Self {
		Self {
			strictness: options.strictness,
			report_warnings: options.report_warnings,
			errors: Vec::new(),
			warnings: Vec::new(),
			failed_names: FxHashSet::default(),
		}
	}

	pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
		match diagnostic.severity() {
			Severity::Warning => {
				if self.report_warnings {
					tracing::debug!(kind = %diagnostic.kind, message = %diagnostic.message, "model warning");
					self.warnings.push(diagnostic);
				}
			}
			Severity::Error => {
				if self.halted() {
					return;
				}
				tracing::debug!(kind = %diagnostic.kind, message = %diagnostic.message, "model diagnostic");
				if let Some(name) = &diagnostic.qualified_name {
					self.failed_names.insert(name.clone());
				}
				self.errors.push(diagnostic);
			}
		}
	}

	pub(crate) fn error(&mut self, err: ModelError) {
		self.push(err.into());
	}

	/// Marks a name as failed without recording a diagnostic for it.
	pub(crate) fn poison(&mut self, name: &Arc<str>) {
		self.failed_names.insert(name.clone());
	}

	pub(crate) fn has_failed(&self, name: &str) -> bool {
		self.failed_names.contains(name)
	}

	pub(crate) fn halted(&self) -> bool {
		self.strictness == Strictness::Strict && !self.errors.is_empty()
	}

	pub(crate) fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub(crate) fn into_failure(self, phase: BuildPhase) -> DiagnosticSet {
		DiagnosticSet::new(phase, self.errors)
	}

	/// Consumes the collector, returning errors and warnings.
	pub(crate) fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
		(self.errors, self.warnings)
	}
}
