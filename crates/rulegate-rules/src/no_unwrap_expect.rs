//! Rule to forbid `.unwrap()` and `.expect()` in production Rust code.
//!
//! # Rationale
//!
//! Using `.unwrap()` or `.expect()` can cause panics at runtime, which is
//! undesirable in production code. This rule helps enforce proper error handling.
//!
//! # Configuration
//!
//! - `allow_in_tests`: Allow in test code (default: true)
//! - `allow_expect`: Allow `.expect()` but forbid `.unwrap()` (default: false)
//!
//! # Suppression
//!
//! - `#[allow(clippy::unwrap_used)]` on the item
//! - `// rulegate: allow(no-unwrap-expect) reason="..."` comment

use rulegate_core::utils::{has_allow_attr, has_cfg_test, has_test_attr};
use rulegate_core::{
    AstCheck, AstMatcher, Category, FileFilter, MatchContext, MatchResult, Rule, RuleConfig,
    RuleDefinitionError, Severity,
};
use syn::visit::Visit;
use syn::{Expr, ExprMethodCall, ImplItemFn, ItemFn, ItemImpl, ItemMod};

/// Rule id for no-unwrap-expect.
pub const ID: &str = "no-unwrap-expect";

const ALLOW_LINTS: [&str; 2] = ["clippy::unwrap_used", "clippy::expect_used"];

/// Forbids `.unwrap()` and `.expect()` calls in production code.
#[derive(Debug, Clone)]
pub struct NoUnwrapExpect {
    /// Allow in test code.
    pub allow_in_tests: bool,
    /// Allow `.expect()` (only forbid `.unwrap()`).
    pub allow_expect: bool,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoUnwrapExpect {
    fn default() -> Self {
        Self::new()
    }
}

impl NoUnwrapExpect {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_in_tests: true,
            allow_expect: false,
            severity: Severity::Error,
        }
    }

    /// Sets whether to allow in test code.
    #[must_use]
    pub fn allow_in_tests(mut self, allow: bool) -> Self {
        self.allow_in_tests = allow;
        self
    }

    /// Sets whether to allow `.expect()`.
    #[must_use]
    pub fn allow_expect(mut self, allow: bool) -> Self {
        self.allow_expect = allow;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Applies `[rules.no-unwrap-expect]` options.
    #[must_use]
    pub fn configure(mut self, config: &RuleConfig) -> Self {
        self.allow_in_tests = config.get_bool("allow_in_tests", self.allow_in_tests);
        self.allow_expect = config.get_bool("allow_expect", self.allow_expect);
        self
    }

    /// Builds the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleDefinitionError`] if the rule cannot be built.
    pub fn into_rule(self) -> Result<Rule, RuleDefinitionError> {
        let mut filter = FileFilter::new().extensions(["rs"]);
        if self.allow_in_tests {
            filter = filter.skip_tests();
        }

        Rule::builder(ID)
            .category(Category::Behavior)
            .severity(self.severity)
            .description("Forbids .unwrap() and .expect() in production code")
            .message("`.{method}()` is forbidden in production code{note}")
            .help("use `?`, `.ok_or(..)?` or pattern matching; attach context to the error")
            .matcher(AstMatcher::new(UnwrapExpectCheck {
                allow_in_tests: self.allow_in_tests,
                allow_expect: self.allow_expect,
            }))
            .applies_to(filter)
            .build()
    }
}

struct UnwrapExpectCheck {
    allow_in_tests: bool,
    allow_expect: bool,
}

impl AstCheck for UnwrapExpectCheck {
    fn check(&self, file: &syn::File, _cx: &MatchContext<'_>) -> Vec<MatchResult> {
        let mut visitor = UnwrapExpectVisitor {
            check: self,
            matches: Vec::new(),
            in_test_context: false,
            in_allowed_context: false,
        };
        visitor.visit_file(file);
        visitor.matches
    }
}

struct UnwrapExpectVisitor<'a> {
    check: &'a UnwrapExpectCheck,
    matches: Vec<MatchResult>,
    in_test_context: bool,
    in_allowed_context: bool,
}

impl UnwrapExpectVisitor<'_> {
    /// Runs `visit` with the test/allow flags raised for the item's attributes.
    fn scoped(&mut self, attrs: &[syn::Attribute], visit: impl FnOnce(&mut Self)) {
        let was_in_test = self.in_test_context;
        let was_allowed = self.in_allowed_context;

        if has_test_attr(attrs) || has_cfg_test(attrs) {
            self.in_test_context = true;
        }
        if has_allow_attr(attrs, &ALLOW_LINTS) {
            self.in_allowed_context = true;
        }

        visit(self);

        self.in_test_context = was_in_test;
        self.in_allowed_context = was_allowed;
    }

    fn skipping(&self) -> bool {
        self.in_allowed_context || (self.check.allow_in_tests && self.in_test_context)
    }
}

impl<'ast> Visit<'ast> for UnwrapExpectVisitor<'_> {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        self.scoped(&node.attrs, |v| syn::visit::visit_item_mod(v, node));
    }

    fn visit_item_impl(&mut self, node: &'ast ItemImpl) {
        self.scoped(&node.attrs, |v| syn::visit::visit_item_impl(v, node));
    }

    fn visit_item_fn(&mut self, node: &'ast ItemFn) {
        self.scoped(&node.attrs, |v| syn::visit::visit_item_fn(v, node));
    }

    fn visit_impl_item_fn(&mut self, node: &'ast ImplItemFn) {
        self.scoped(&node.attrs, |v| syn::visit::visit_impl_item_fn(v, node));
    }

    fn visit_expr_method_call(&mut self, node: &'ast ExprMethodCall) {
        if !self.skipping() {
            let is_unwrap = node.method == "unwrap";
            let is_expect = node.method == "expect";

            if is_unwrap || (is_expect && !self.check.allow_expect) {
                // partial_cmp().unwrap() panics on NaN
                let note = if is_unwrap && is_partial_cmp_chain(&node.receiver) {
                    " (NaN comparison danger with partial_cmp)"
                } else {
                    ""
                };
                self.matches.push(
                    MatchResult::from_span(node.method.span())
                        .with("method", node.method.to_string())
                        .with("note", note),
                );
            }
        }

        syn::visit::visit_expr_method_call(self, node);
    }
}

/// Checks if the receiver is a `partial_cmp()` call.
fn is_partial_cmp_chain(expr: &Expr) -> bool {
    if let Expr::MethodCall(call) = expr {
        call.method == "partial_cmp"
    } else {
        false
    }
}
