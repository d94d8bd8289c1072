//! Structural render stage.
//!
//! A [`Skeleton`] is the binding-independent part of rendering: all static
//! markup is written once, and every directive becomes a numbered slot to be
//! filled at render time.

use std::marker::PhantomData;

use crate::ast::{Directive, Node};
use crate::formula::{Formula, FormulaError};

use super::backend::RenderBackend;

/// A piece of the render plan.
#[derive(Debug)]
pub(crate) enum Part<B> {
    /// Pre-rendered markup.
    Static(String),
    /// `:value` slot.
    Value {
        slot: usize,
        key: String,
        unit: Option<String>,
    },
    /// `:score` slot with its formula parsed up front.
    Score {
        slot: usize,
        formula: Result<Formula, FormulaError>,
        unit: Option<String>,
    },
    /// `:::selector` slot with one sub-plan per case, in document order.
    Selector {
        slot: usize,
        key: String,
        cases: Vec<(String, Skeleton<B>)>,
    },
}

/// Compiled render plan for one backend.
#[derive(Debug)]
pub struct Skeleton<B> {
    pub(crate) parts: Vec<Part<B>>,
    slot_count: usize,
    _backend: PhantomData<fn() -> B>,
}

impl<B: RenderBackend> Skeleton<B> {
    /// Compile a directive tree.
    pub fn build(tree: &Node) -> Self {
        let mut next_slot = 0;
        let parts = Builder::<B>::new(&mut next_slot).build(std::slice::from_ref(tree));
        Self {
            parts,
            slot_count: next_slot,
            _backend: PhantomData,
        }
    }

    fn nested(parts: Vec<Part<B>>) -> Self {
        Self {
            parts,
            slot_count: 0,
            _backend: PhantomData,
        }
    }
}

impl<B> Skeleton<B> {
    /// Number of dynamic slots, including those inside cases.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Whether the plan has no dynamic slots at all.
    pub fn is_static(&self) -> bool {
        self.slot_count == 0
    }
}

struct Builder<'n, B> {
    next_slot: &'n mut usize,
    parts: Vec<Part<B>>,
    buf: String,
}

impl<'n, B: RenderBackend> Builder<'n, B> {
    fn new(next_slot: &'n mut usize) -> Self {
        Self {
            next_slot,
            parts: Vec::new(),
            buf: String::new(),
        }
    }

    fn build(mut self, nodes: &[Node]) -> Vec<Part<B>> {
        for node in nodes {
            self.node(node);
        }
        self.flush();
        self.parts
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.parts.push(Part::Static(std::mem::take(&mut self.buf)));
        }
    }

    fn slot(&mut self) -> usize {
        let slot = *self.next_slot;
        *self.next_slot += 1;
        slot
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Structural(element) => {
                B::element_start(&element.kind, &mut self.buf);
                for child in &element.children {
                    self.node(child);
                }
                B::element_end(&element.kind, &mut self.buf);
            }
            Node::Value(directive) => {
                let Some(key) = primary(directive) else {
                    return;
                };
                self.flush();
                let slot = self.slot();
                self.parts.push(Part::Value {
                    slot,
                    key: key.to_owned(),
                    unit: directive.attrs.unit.clone(),
                });
            }
            Node::Score(directive) => {
                self.flush();
                let slot = self.slot();
                let formula = Formula::parse(directive.attrs.formula.as_deref().unwrap_or_default());
                self.parts.push(Part::Score {
                    slot,
                    formula,
                    unit: directive.attrs.unit.clone(),
                });
            }
            Node::Selector(directive) => {
                let Some(key) = primary(directive) else {
                    return;
                };
                self.flush();
                let slot = self.slot();
                let mut cases = Vec::new();
                for child in &directive.children {
                    let Node::Case(case) = child else {
                        continue;
                    };
                    let Some(label) = primary(case) else {
                        continue;
                    };
                    let parts = Builder::<B>::new(&mut *self.next_slot).build(&case.children);
                    cases.push((label.to_owned(), Skeleton::nested(parts)));
                }
                self.parts.push(Part::Selector {
                    slot,
                    key: key.to_owned(),
                    cases,
                });
            }
            // Cases are only rendered through their selector.
            Node::Case(directive) => {
                for child in &directive.children {
                    self.node(child);
                }
            }
        }
    }
}

fn primary(directive: &Directive) -> Option<&str> {
    directive
        .attrs
        .primary
        .as_deref()
        .filter(|key| !key.trim().is_empty())
}
