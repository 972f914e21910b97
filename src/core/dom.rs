// src/core/dom.rs
use super::html;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    tag: String,
    classes: Vec<String>,
}

impl Selector {
    /// `"div.van-col.van-col--5"` → tag `div`, classes `[van-col, van-col--5]`.
    /// A missing tag means `div`.
    pub fn parse(css: &str) -> Selector {
        let mut parts = css.trim().split('.');
        let tag = parts.next().unwrap_or("").to_ascii_lowercase();
        let classes = parts.filter(|c| !c.is_empty()).map(|c| c.to_string()).collect();
        Selector { tag: if tag.is_empty() { s!("div") } else { tag }, classes }
    }

    pub fn tag(&self) -> &str { &self.tag }

    pub fn matches_opener(&self, open_tag: &str) -> bool {
        let have = html::class_list(open_tag);
        self.classes.iter().all(|want| have.iter().any(|c| c == want))
    }
}

/// What the extractor needs from one rendered element.
pub trait Element: Sized {
    /// First descendant matching `sel`.
    fn find(&self, sel: &Selector) -> Option<Self>;
    /// Every descendant matching `sel`, in document order.
    fn find_all(&self, sel: &Selector) -> Vec<Self>;
    /// Visible text, whitespace-normalised.
    fn text(&self) -> String;
    /// Value of a CSS property as a browser would report it.
    /// `background-color` of an element without one is `rgba(0, 0, 0, 0)`.
    fn css_value(&self, property: &str) -> String;
}

pub const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

/// An element backed by its outer HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlElement {
    outer: String,
}

impl HtmlElement {
    pub fn new(outer: impl Into<String>) -> Self {
        Self { outer: outer.into() }
    }

    pub fn outer_html(&self) -> &str {
        &self.outer
    }

    /// Elements of a whole document matching `sel`.
    pub fn select(doc: &str, sel: &Selector) -> Vec<HtmlElement> {
        html::elements_ci(doc, sel.tag())
            .into_iter()
            .map(|(s, e)| &doc[s..e])
            .filter(|block| sel.matches_opener(html::opener(block)))
            .map(HtmlElement::new)
            .collect()
    }

    fn inner(&self) -> String {
        html::inner_after_open_tag(&self.outer)
    }
}

impl Element for HtmlElement {
    fn find(&self, sel: &Selector) -> Option<Self> {
        self.find_all(sel).into_iter().next()
    }

    fn find_all(&self, sel: &Selector) -> Vec<Self> {
        HtmlElement::select(&self.inner(), sel)
    }

    fn text(&self) -> String {
        html::visible_text(&self.outer)
    }

    fn css_value(&self, property: &str) -> String {
        match html::style_property(html::opener(&self.outer), property) {
            Some(v) => v,
            None if property.eq_ignore_ascii_case("background-color") => s!(TRANSPARENT),
            None => s!(),
        }
    }
}
