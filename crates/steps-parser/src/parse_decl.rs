//! File-level and definition parsing.
//!
//! Handles the three file kinds (`building:`, `floor:`, `step:`), the step
//! sections (`belongs to:`, `expects:`, `returns:`, `declare:`, `riser:`,
//! `do:`) which may appear in any order, and riser definitions.

use steps_lexer::TokenKind;
use steps_types::ast::*;
use steps_types::{ErrorCode, Span};

use crate::parser::Parser;

/// Sections shared by steps and risers.
#[derive(Default)]
struct Sections {
    belongs_to: Option<Ident>,
    parameters: Vec<Param>,
    return_decl: Option<ReturnDecl>,
    risers: Vec<RiserDef>,
    declarations: Vec<Declaration>,
    body: Option<Block>,
}

/// Which definition is being parsed; risers accept fewer sections.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Owner {
    Step,
    Riser,
}

impl Owner {
    fn label(self) -> &'static str {
        match self {
            Owner::Step => "step",
            Owner::Riser => "riser",
        }
    }
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // File Headers
    // ══════════════════════════════════════════════════════════════════════════

    /// Consume the `building:` / `floor:` / `step:` header and its name line.
    fn parse_header(&mut self, kind: FileKind) -> Option<(Ident, Span)> {
        let expected = match kind {
            FileKind::Building => TokenKind::Building,
            FileKind::Floor => TokenKind::Floor,
            FileKind::Step => TokenKind::Step,
        };
        if !self.check_exact(&expected) {
            match self.peek_kind().clone() {
                TokenKind::BareStructural(word) if word == kind.to_string() => {
                    self.missing_colon(&word);
                }
                other => {
                    let span = self.current_span();
                    self.error_with_hint(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!(
                            "Expected '{}' at the start of a {kind} file, found '{other}'.",
                            kind.header()
                        ),
                        span,
                        format!("Start the file with '{} <name>'.", kind.header()),
                    );
                }
            }
            return None;
        }
        let start = self.advance();
        let name = self.expect_identifier(&format!("a {kind} name after '{}'", kind.header()))?;
        self.expect_newline()?;
        Some((name, start))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Building
    // ══════════════════════════════════════════════════════════════════════════

    /// `building: name` NL INDENT statements DEDENT
    pub(crate) fn parse_building(&mut self) -> Option<BuildingDef> {
        let (name, start) = self.parse_header(FileKind::Building)?;
        let leading = self.take_leading_notes();
        let body = match self.expect_indent("building:") {
            Some(indent) => self.parse_statements_until_dedent(leading, indent),
            None => Block::new(leading, self.current_span()),
        };
        let span = start.merge(self.previous_span());
        Some(BuildingDef { name, body, span })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Floor
    // ══════════════════════════════════════════════════════════════════════════

    /// `floor: name` NL INDENT (`step: name` NL)* DEDENT
    pub(crate) fn parse_floor(&mut self) -> Option<FloorDef> {
        let (name, start) = self.parse_header(FileKind::Floor)?;
        self.skip_trivia();
        let mut step_names = Vec::new();

        if self.expect_indent("floor:").is_some() {
            while !self.at_block_end() {
                if self.too_many_errors() {
                    break;
                }
                self.skip_trivia();
                if self.at_block_end() {
                    break;
                }
                match self.peek_kind().clone() {
                    TokenKind::Step => {
                        self.advance();
                        match self.expect_identifier("a step name after 'step:'") {
                            Some(step_name) => {
                                step_names.push(step_name);
                                if self.expect_newline().is_none() {
                                    self.skip_line();
                                }
                            }
                            None => self.skip_line(),
                        }
                    }
                    TokenKind::BareStructural(word) if word == "step" => {
                        self.missing_colon(&word);
                        self.skip_line();
                    }
                    other => {
                        let span = self.current_span();
                        self.error_with_hint(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!("Expected a 'step:' line in the floor, found '{other}'."),
                            span,
                            "A floor only lists its steps, one 'step: name' per line.",
                        );
                        self.skip_line();
                    }
                }
            }
            self.eat(&TokenKind::Dedent);
        }

        let span = start.merge(self.previous_span());
        Some(FloorDef {
            name,
            step_names,
            span,
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Step
    // ══════════════════════════════════════════════════════════════════════════

    /// `step: name` NL INDENT sections DEDENT
    pub(crate) fn parse_step(&mut self) -> Option<StepDef> {
        let (name, start) = self.parse_header(FileKind::Step)?;
        self.skip_trivia();
        let sections = match self.expect_indent("step:") {
            Some(_) => self.parse_sections(Owner::Step),
            None => Sections::default(),
        };
        let span = start.merge(self.previous_span());

        let belongs_to = match sections.belongs_to {
            Some(floor) => floor,
            None => {
                self.error_with_hint(
                    ErrorCode::MISSING_BELONGS_TO,
                    format!("Step '{}' is missing its 'belongs to:' line.", name.name),
                    name.span,
                    "Add 'belongs to: <floor name>' so the step knows its floor.",
                );
                Ident::new("", name.span)
            }
        };
        let body = self.require_body(sections.body, Owner::Step, &name);

        Some(StepDef {
            name,
            belongs_to,
            parameters: sections.parameters,
            return_decl: sections.return_decl,
            risers: sections.risers,
            declarations: sections.declarations,
            body,
            span,
        })
    }

    /// `riser: name` NL INDENT sections DEDENT (the `riser:` token is current).
    fn parse_riser(&mut self) -> Option<RiserDef> {
        let start = self.advance();
        let name = self.expect_identifier("a riser name after 'riser:'")?;
        self.expect_newline()?;
        self.skip_trivia();
        let sections = match self.expect_indent("riser:") {
            Some(_) => self.parse_sections(Owner::Riser),
            None => Sections::default(),
        };
        let span = start.merge(self.previous_span());
        let body = self.require_body(sections.body, Owner::Riser, &name);
        Some(RiserDef {
            name,
            parameters: sections.parameters,
            return_decl: sections.return_decl,
            declarations: sections.declarations,
            body,
            span,
        })
    }

    fn require_body(&mut self, body: Option<Block>, owner: Owner, name: &Ident) -> Block {
        match body {
            Some(block) => block,
            None => {
                self.error_with_hint(
                    ErrorCode::MISSING_DO,
                    format!(
                        "The {} '{}' has no 'do:' section.",
                        owner.label(),
                        name.name
                    ),
                    name.span,
                    "Add a 'do:' line followed by the indented statements to run.",
                );
                Block::new(Vec::new(), name.span)
            }
        }
    }

    /// Parse sections until the `Dedent` closing the definition.
    fn parse_sections(&mut self, owner: Owner) -> Sections {
        let mut sections = Sections::default();

        while !self.at_block_end() {
            if self.too_many_errors() {
                break;
            }
            self.skip_trivia();
            if self.at_block_end() {
                break;
            }

            let section_span = self.current_span();
            match self.peek_kind().clone() {
                TokenKind::BelongsTo if owner == Owner::Step => {
                    self.advance();
                    match self.expect_identifier("a floor name after 'belongs to:'") {
                        Some(floor) => {
                            if sections.belongs_to.is_some() {
                                self.duplicate_section("belongs to:", section_span);
                            }
                            sections.belongs_to = Some(floor);
                            self.finish_section_line();
                        }
                        None => self.skip_line(),
                    }
                }
                TokenKind::Expects => {
                    self.advance();
                    match self.parse_parameters() {
                        Some(params) => {
                            sections.parameters = params;
                            self.finish_section_line();
                        }
                        None => self.skip_line(),
                    }
                }
                TokenKind::Returns => {
                    self.advance();
                    match self.parse_return_decl() {
                        Some(decl) => {
                            sections.return_decl = decl;
                            self.finish_section_line();
                        }
                        None => self.skip_line(),
                    }
                }
                TokenKind::Declare => {
                    self.advance();
                    if self.expect_newline().is_none() {
                        self.skip_line();
                        continue;
                    }
                    sections.declarations.extend(self.parse_declarations());
                }
                TokenKind::Riser if owner == Owner::Step => match self.parse_riser() {
                    Some(riser) => sections.risers.push(riser),
                    None => self.skip_line(),
                },
                TokenKind::Do => {
                    self.advance();
                    if let Some(block) = self.parse_block("do:") {
                        if sections.body.is_some() {
                            self.duplicate_section("do:", section_span);
                        }
                        sections.body = Some(block);
                    }
                }
                TokenKind::BareStructural(word) => {
                    self.missing_colon(&word);
                    self.skip_line();
                }
                other => {
                    let hint = match owner {
                        Owner::Step => {
                            "A step contains 'belongs to:', 'expects:', 'returns:', \
                             'declare:', 'riser:' and 'do:' sections."
                        }
                        Owner::Riser => {
                            "A riser contains 'expects:', 'returns:', 'declare:' \
                             and 'do:' sections."
                        }
                    };
                    self.error_with_hint(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Unexpected '{other}' in {} definition.", owner.label()),
                        section_span,
                        hint,
                    );
                    self.skip_line();
                }
            }
        }
        self.eat(&TokenKind::Dedent);
        sections
    }

    fn finish_section_line(&mut self) {
        if self.expect_newline().is_none() {
            self.skip_line();
        }
    }

    fn duplicate_section(&mut self, section: &str, span: Span) {
        self.error_with_hint(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("'{section}' appears more than once."),
            span,
            "Keep a single section; the last one wins.",
        );
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Section Bodies
    // ══════════════════════════════════════════════════════════════════════════

    /// `nothing` | `name [as type] {, name [as type]}`
    fn parse_parameters(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.eat(&TokenKind::Nothing) {
            return Some(params);
        }
        loop {
            let name = self.expect_identifier("a parameter name")?;
            let type_ann = if self.eat(&TokenKind::As) {
                Some(self.expect_type_name()?)
            } else {
                None
            };
            let span = name.span.merge(self.previous_span());
            params.push(Param {
                name,
                type_ann,
                span,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Some(params)
    }

    /// `nothing` | `name [as type]`
    fn parse_return_decl(&mut self) -> Option<Option<ReturnDecl>> {
        if self.eat(&TokenKind::Nothing) {
            return Some(None);
        }
        let name = self.expect_identifier("the name of the returned value")?;
        let type_ann = if self.eat(&TokenKind::As) {
            Some(self.expect_type_name()?)
        } else {
            None
        };
        let span = name.span.merge(self.previous_span());
        Some(Some(ReturnDecl {
            name,
            type_ann,
            span,
        }))
    }

    /// INDENT (`name as type [fixed]` NL)* DEDENT; an empty `declare:` is allowed.
    fn parse_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        self.skip_trivia();
        if !self.eat(&TokenKind::Indent) {
            return declarations;
        }

        while !self.at_block_end() {
            if self.too_many_errors() {
                break;
            }
            self.skip_trivia();
            if self.at_block_end() {
                break;
            }
            match self.parse_declaration() {
                Some(decl) => declarations.push(decl),
                None => self.skip_line(),
            }
        }
        self.eat(&TokenKind::Dedent);
        declarations
    }

    fn parse_declaration(&mut self) -> Option<Declaration> {
        let name = self.expect_identifier("a variable name in 'declare:'")?;
        self.expect(&TokenKind::As)?;
        let declared_type = self.expect_type_name()?;
        let is_fixed = self.eat(&TokenKind::Fixed);
        let span = name.span.merge(self.previous_span());
        self.expect_newline()?;
        Some(Declaration {
            name,
            declared_type,
            is_fixed,
            span,
        })
    }
}
