//! Data render stage.
//!
//! The [`Renderer`] fills the slots of a [`Skeleton`] from the current
//! bindings. Each slot reads bindings through a [`BindingContext`]; the
//! recorded reads and the slot's output are kept, and on the next render a
//! slot whose reads all return equal values reuses its previous output.
//! When no slot changed at all, the previous document is returned as is.

use crate::binding::{BindingContext, Lookup, Read, reads_unchanged};
use crate::formula::Evaluation;

use super::backend::RenderBackend;
use super::skeleton::{Part, Skeleton};

/// Slot counts of the most recent render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Slots evaluated from the bindings.
    pub recomputed: usize,
    /// Slots whose previous output was reused.
    pub reused: usize,
}

/// Memoized result of one slot.
#[derive(Clone, Debug)]
enum SlotOutput {
    /// Rendered value or score.
    Text(String),
    /// Index of the selected case, if any matched.
    Case(Option<usize>),
}

#[derive(Debug)]
struct SlotMemo {
    reads: Vec<Read>,
    output: SlotOutput,
}

/// Renders a skeleton against changing bindings.
///
/// # Example
///
/// ```
/// use bf_engine::{Bindings, BindingValue, Renderer, Skeleton, TextBackend, parse};
///
/// let tree = parse(r#"Name: :value{primary="name"}"#)?;
/// let mut renderer = Renderer::new(Skeleton::<TextBackend>::build(&tree));
///
/// let mut bindings = Bindings::new();
/// bindings.insert("name".to_owned(), BindingValue::from("Müller"));
/// assert_eq!(renderer.render(&bindings), "Name: Müller\n");
///
/// renderer.render(&bindings);
/// assert_eq!(renderer.stats().reused, 1);
/// # Ok::<(), bf_engine::SyntaxError>(())
/// ```
#[derive(Debug)]
pub struct Renderer<B> {
    skeleton: Skeleton<B>,
    memo: Vec<Option<SlotMemo>>,
    stats: RenderStats,
    last: Option<String>,
}

impl<B: RenderBackend> Renderer<B> {
    /// Create a renderer with an empty memo.
    pub fn new(skeleton: Skeleton<B>) -> Self {
        let memo = std::iter::repeat_with(|| None)
            .take(skeleton.slot_count())
            .collect();
        Self {
            skeleton,
            memo,
            stats: RenderStats::default(),
            last: None,
        }
    }

    /// Render with the given bindings.
    pub fn render(&mut self, bindings: &dyn Lookup) -> String {
        if let Some(last) = self.unchanged_output(bindings) {
            self.stats = RenderStats {
                recomputed: 0,
                reused: self.stats.recomputed + self.stats.reused,
            };
            tracing::trace!(reused = self.stats.reused, "Rendered from previous output");
            return last;
        }

        self.stats = RenderStats::default();
        let capacity = self.last.as_ref().map_or(0, String::len);
        let mut out = String::with_capacity(capacity);
        render_parts::<B>(
            &self.skeleton.parts,
            bindings,
            &mut self.memo,
            &mut self.stats,
            &mut out,
        );
        tracing::trace!(
            recomputed = self.stats.recomputed,
            reused = self.stats.reused,
            "Rendered"
        );
        self.last = Some(out.clone());
        out
    }

    /// The previous output, if every memoized slot would be reused.
    ///
    /// Memo entries of cases not taken last time are checked too, so a
    /// change there falls back to a full render.
    fn unchanged_output(&self, bindings: &dyn Lookup) -> Option<String> {
        let last = self.last.as_ref()?;
        self.memo
            .iter()
            .flatten()
            .all(|memo| reads_unchanged(&memo.reads, bindings))
            .then(|| last.clone())
    }

    /// Slot counts of the last [`render`](Self::render) call.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Drop all memoized slot output.
    pub fn clear(&mut self) {
        self.memo.iter_mut().for_each(|slot| *slot = None);
        self.last = None;
    }

    /// The compiled plan being rendered.
    pub fn skeleton(&self) -> &Skeleton<B> {
        &self.skeleton
    }
}

fn render_parts<B: RenderBackend>(
    parts: &[Part<B>],
    bindings: &dyn Lookup,
    memo: &mut [Option<SlotMemo>],
    stats: &mut RenderStats,
    out: &mut String,
) {
    for part in parts {
        let slot = match part {
            Part::Static(markup) => {
                out.push_str(markup);
                continue;
            }
            Part::Value { slot, .. } | Part::Score { slot, .. } | Part::Selector { slot, .. } => {
                *slot
            }
        };

        let cached = memo
            .get(slot)
            .and_then(Option::as_ref)
            .filter(|m| reads_unchanged(&m.reads, bindings))
            .map(|m| m.output.clone());

        let output = if let Some(output) = cached {
            stats.reused += 1;
            output
        } else {
            stats.recomputed += 1;
            let ctx = BindingContext::new(bindings);
            let output = compute::<B>(part, &ctx);
            if let Some(entry) = memo.get_mut(slot) {
                *entry = Some(SlotMemo {
                    reads: ctx.into_reads(),
                    output: output.clone(),
                });
            }
            output
        };

        match (output, part) {
            (SlotOutput::Text(text), _) => out.push_str(&text),
            (SlotOutput::Case(Some(index)), Part::Selector { cases, .. }) => {
                if let Some((_, body)) = cases.get(index) {
                    render_parts::<B>(&body.parts, bindings, memo, stats, out);
                }
            }
            (SlotOutput::Case(_), _) => {}
        }
    }
}

fn compute<B: RenderBackend>(part: &Part<B>, ctx: &BindingContext<'_>) -> SlotOutput {
    match part {
        Part::Value { key, unit, .. } => {
            let mut out = String::new();
            if let Some(value) = ctx.get(key) {
                B::directive_value(&value.to_string(), unit.as_deref(), &mut out);
            }
            SlotOutput::Text(out)
        }
        Part::Score { formula, unit, .. } => {
            let evaluation = match formula {
                Ok(formula) => Evaluation::Number(formula.evaluate(ctx)),
                Err(_) => Evaluation::Error,
            };
            let mut out = String::new();
            B::directive_value(&evaluation.to_string(), unit.as_deref(), &mut out);
            SlotOutput::Text(out)
        }
        Part::Selector { key, cases, .. } => {
            let state = ctx.get(key).map(ToString::to_string);
            let index = state.and_then(|state| cases.iter().position(|(label, _)| *label == state));
            SlotOutput::Case(index)
        }
        Part::Static(markup) => SlotOutput::Text(markup.clone()),
    }
}

/// Render a directive tree once.
///
/// Equivalent to building a [`Skeleton`] and rendering it with a fresh
/// [`Renderer`]; the output depends only on `tree` and `bindings`.
pub fn render<B: RenderBackend>(tree: &crate::ast::Node, bindings: &dyn Lookup) -> String {
    Renderer::new(Skeleton::<B>::build(tree)).render(bindings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::binding::{BindingValue, Bindings};
    use crate::render::{HtmlBackend, TextBackend};
    use crate::transform::parse;

    fn bindings(pairs: &[(&str, BindingValue)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    const SELECTOR: &str = "\
:::selector{primary=\"g\"}
:::case{primary=\"w\"}
weiblich :value{primary=\"ssw\" unit=\"SSW\"}
:::
:::case{primary=\"m\"}
männlich
:::
:::
";

    #[test]
    fn test_value_with_unit() {
        let tree = parse(r#"Gewicht :value{primary="w" unit="kg"}"#).unwrap();
        let out = render::<TextBackend>(&tree, &bindings(&[("w", BindingValue::Number(80.0))]));
        assert_eq!(out, "Gewicht 80 kg\n");
    }

    #[test]
    fn test_unbound_value_renders_nothing() {
        let tree = parse(r#"Gewicht :value{primary="w" unit="kg"}"#).unwrap();
        assert_eq!(render::<TextBackend>(&tree, &Bindings::new()), "Gewicht \n");
    }

    #[test]
    fn test_value_is_escaped_in_html() {
        let tree = parse(r#":value{primary="x"}"#).unwrap();
        let out = render::<HtmlBackend>(&tree, &bindings(&[("x", BindingValue::from("<b>"))]));
        assert_eq!(out, "<p>&lt;b&gt;</p>");
    }

    #[test]
    fn test_selector_branches() {
        let tree = parse(SELECTOR).unwrap();

        let out = render::<TextBackend>(
            &tree,
            &bindings(&[
                ("g", BindingValue::from("w")),
                ("ssw", BindingValue::Number(12.0)),
            ]),
        );
        assert_eq!(out, "weiblich 12 SSW\n");

        let out = render::<TextBackend>(&tree, &bindings(&[("g", BindingValue::from("m"))]));
        assert_eq!(out, "männlich\n");

        let out = render::<TextBackend>(&tree, &bindings(&[("g", BindingValue::from("x"))]));
        assert_eq!(out, "");
        assert_eq!(render::<TextBackend>(&tree, &Bindings::new()), "");
    }

    #[test]
    fn test_selector_matches_number_display() {
        let source = ":::selector{primary=\"n\"}\n:::case{primary=\"2\"}\nzwei\n:::\n:::\n";
        let tree = parse(source).unwrap();
        let out = render::<TextBackend>(&tree, &bindings(&[("n", BindingValue::Number(2.0))]));
        assert_eq!(out, "zwei\n");
    }

    #[test]
    fn test_score_display() {
        let tree = parse(r#":score{formula="a+b" unit="Punkte"}"#).unwrap();

        let out = render::<TextBackend>(
            &tree,
            &bindings(&[("a", BindingValue::Number(3.0)), ("b", BindingValue::Number(4.0))]),
        );
        assert_eq!(out, "7 Punkte\n");

        let tree = parse(r#":score{formula="a;b" unit="Punkte"}"#).unwrap();
        assert_eq!(render::<TextBackend>(&tree, &Bindings::new()), "Error Punkte\n");
    }

    #[test]
    fn test_memo_reuses_unchanged_slots() {
        let tree = parse(":value{primary=\"a\"} :value{primary=\"b\"} :score{formula=\"a*2\"}").unwrap();
        let mut renderer = Renderer::new(Skeleton::<TextBackend>::build(&tree));
        let mut input = bindings(&[("a", BindingValue::Number(1.0)), ("b", BindingValue::Number(5.0))]);

        assert_eq!(renderer.render(&input), "1 5 2\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 3, reused: 0 });

        input.insert("b".to_owned(), BindingValue::Number(6.0));
        assert_eq!(renderer.render(&input), "1 6 2\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 1, reused: 2 });

        input.insert("a".to_owned(), BindingValue::Number(2.0));
        assert_eq!(renderer.render(&input), "2 6 4\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 2, reused: 1 });
    }

    #[test]
    fn test_memo_inside_cases() {
        let tree = parse(SELECTOR).unwrap();
        let mut renderer = Renderer::new(Skeleton::<TextBackend>::build(&tree));
        let mut input = bindings(&[("g", BindingValue::from("w")), ("ssw", BindingValue::Number(10.0))]);

        renderer.render(&input);
        assert_eq!(renderer.stats(), RenderStats { recomputed: 2, reused: 0 });

        input.insert("ssw".to_owned(), BindingValue::Number(11.0));
        assert_eq!(renderer.render(&input), "weiblich 11 SSW\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 1, reused: 1 });

        input.insert("g".to_owned(), BindingValue::from("m"));
        assert_eq!(renderer.render(&input), "männlich\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 1, reused: 0 });
    }

    #[test]
    fn test_unchanged_bindings_return_previous_output() {
        let tree = parse(SELECTOR).unwrap();
        let mut renderer = Renderer::new(Skeleton::<TextBackend>::build(&tree));
        let mut input = bindings(&[("g", BindingValue::from("w")), ("ssw", BindingValue::Number(9.0))]);

        let first = renderer.render(&input);
        assert_eq!(renderer.render(&input), first);
        assert_eq!(renderer.stats(), RenderStats { recomputed: 0, reused: 2 });
        assert_eq!(renderer.render(&input), first);
        assert_eq!(renderer.stats(), RenderStats { recomputed: 0, reused: 2 });

        input.insert("g".to_owned(), BindingValue::from("m"));
        assert_eq!(renderer.render(&input), "männlich\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 1, reused: 0 });

        // The stale `ssw` slot of the untaken case still gates the shortcut.
        input.insert("ssw".to_owned(), BindingValue::Number(10.0));
        assert_eq!(renderer.render(&input), "männlich\n");
        assert_eq!(renderer.stats(), RenderStats { recomputed: 0, reused: 1 });
    }

    #[test]
    fn test_clear_forces_recompute() {
        let tree = parse(r#":value{primary="a"}"#).unwrap();
        let mut renderer = Renderer::new(Skeleton::<TextBackend>::build(&tree));
        let input = bindings(&[("a", BindingValue::Number(1.0))]);

        renderer.render(&input);
        renderer.clear();
        renderer.render(&input);
        assert_eq!(renderer.stats(), RenderStats { recomputed: 1, reused: 0 });
    }

    #[test]
    fn test_render_is_deterministic() {
        let tree = parse(SELECTOR).unwrap();
        let input = bindings(&[("g", BindingValue::from("w")), ("ssw", BindingValue::Number(8.0))]);
        assert_eq!(
            render::<HtmlBackend>(&tree, &input),
            render::<HtmlBackend>(&tree, &input)
        );
    }
}
