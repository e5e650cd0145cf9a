use super::types::DirectiveKind;

/// What may appear after the keyword inside the brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// `[voice]`
    None,
    /// `[transfer:AMOUNT]`, optionally `:RECIPIENT`
    Amount,
    /// `[sticker:NAME]`
    Name,
    /// `[link:TITLE|SOURCE]`
    TitleSource,
    /// `[quote:NAME:CONTENT]`
    NameContent,
}

/// Whether text following the closing bracket belongs to the directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    None,
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub kind: DirectiveKind,
    pub params: ParamShape,
    pub body: BodyShape,
}

pub const RULES: &[Rule] = &[
    Rule {
        kind: DirectiveKind::Voice,
        params: ParamShape::None,
        body: BodyShape::Required,
    },
    Rule {
        kind: DirectiveKind::RedPacket,
        params: ParamShape::Amount,
        body: BodyShape::Optional,
    },
    Rule {
        kind: DirectiveKind::Transfer,
        params: ParamShape::Amount,
        body: BodyShape::None,
    },
    Rule {
        kind: DirectiveKind::Image,
        params: ParamShape::None,
        body: BodyShape::Required,
    },
    Rule {
        kind: DirectiveKind::Location,
        params: ParamShape::None,
        body: BodyShape::Required,
    },
    Rule {
        kind: DirectiveKind::Sticker,
        params: ParamShape::Name,
        body: BodyShape::None,
    },
    Rule {
        kind: DirectiveKind::Link,
        params: ParamShape::TitleSource,
        body: BodyShape::Optional,
    },
    Rule {
        kind: DirectiveKind::Quote,
        params: ParamShape::NameContent,
        body: BodyShape::None,
    },
];

pub fn rule_for(kind: DirectiveKind) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.kind == kind)
}

/// Half- or full-width colon.
pub fn is_separator(c: char) -> bool {
    matches!(c, ':' | '：')
}

/// Explicit segment delimiter; also ends a directive body.
pub const SEGMENT_DELIMITER: &str = "|||";
