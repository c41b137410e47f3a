//! Program registry: the building, its floors and their steps.
//!
//! A loader walks the project directory and hands every parsed definition
//! to a [`RegistryBuilder`] together with the folder it was found in.
//! `build()` checks the cross-file rules once; the resulting registry is
//! read-only for the rest of the run.

use std::collections::BTreeMap;
use steps_types::ast::{BuildingDef, FloorDef, StepDef};
use steps_types::{ErrorCode, SourceFile, Span, StepsError};

/// A registered step together with where it came from.
#[derive(Debug, Clone)]
pub struct StepEntry {
    /// Folder (floor) the step file lives in.
    pub floor: String,
    pub def: StepDef,
    pub source: SourceFile,
}

#[derive(Debug, Clone)]
struct FloorEntry {
    def: FloorDef,
    source: SourceFile,
}

/// Immutable lookup tables for a validated program.
#[derive(Debug, Clone)]
pub struct ProgramRegistry {
    building: BuildingDef,
    building_source: SourceFile,
    floors: BTreeMap<String, FloorEntry>,
    steps: BTreeMap<String, StepEntry>,
}

impl ProgramRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn building(&self) -> &BuildingDef {
        &self.building
    }

    pub fn building_source(&self) -> &SourceFile {
        &self.building_source
    }

    pub fn step(&self, name: &str) -> Option<&StepEntry> {
        self.steps.get(name)
    }

    /// Step names in sorted order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    /// Step names listed by a floor, in file order.
    pub fn floor_steps(&self, floor: &str) -> Option<Vec<&str>> {
        self.floors
            .get(floor)
            .map(|entry| entry.def.step_names.iter().map(|s| s.name.as_str()).collect())
    }

    pub fn floor_names(&self) -> impl Iterator<Item = &str> {
        self.floors.keys().map(String::as_str)
    }

    /// The step that defines a riser with this name, if any.
    pub fn riser_owner(&self, riser: &str) -> Option<&str> {
        self.steps
            .values()
            .find(|entry| entry.def.riser(riser).is_some())
            .map(|entry| entry.def.name.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Builder
// ══════════════════════════════════════════════════════════════════════════════

/// Collects definitions and validates them into a [`ProgramRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    building: Option<(BuildingDef, SourceFile)>,
    floors: Vec<(String, FloorDef, SourceFile)>,
    steps: Vec<(String, StepDef, SourceFile)>,
}

impl RegistryBuilder {
    pub fn building(mut self, def: BuildingDef, source: SourceFile) -> Self {
        self.building = Some((def, source));
        self
    }

    /// Add the floor definition found in `folder`.
    pub fn floor(mut self, folder: impl Into<String>, def: FloorDef, source: SourceFile) -> Self {
        self.floors.push((folder.into(), def, source));
        self
    }

    /// Add a step file found in `folder`.
    pub fn step(mut self, folder: impl Into<String>, def: StepDef, source: SourceFile) -> Self {
        self.steps.push((folder.into(), def, source));
        self
    }

    /// Validate and freeze. Every violated rule is reported, not just the first.
    pub fn build(self) -> Result<ProgramRegistry, Vec<StepsError>> {
        let mut errors = Vec::new();

        let mut floors: BTreeMap<String, FloorEntry> = BTreeMap::new();
        for (folder, def, source) in self.floors {
            floors.insert(folder, FloorEntry { def, source });
        }

        let mut steps: BTreeMap<String, StepEntry> = BTreeMap::new();
        for (folder, def, source) in self.steps {
            let name = def.name.name.clone();

            if !floors.contains_key(&folder) {
                errors.push(
                    located(
                        &source,
                        ErrorCode::MISSING_FLOOR,
                        format!("Folder '{folder}' has steps but no floor file."),
                        def.name.span,
                    )
                    .with_hint(format!("Add '{folder}.floor' listing the steps of this floor.")),
                );
            }

            if def.belongs_to.name != folder {
                errors.push(
                    located(
                        &source,
                        ErrorCode::STEP_FLOOR_MISMATCH,
                        format!(
                            "Step '{name}' says it belongs to '{}', but it is in the '{folder}' folder.",
                            def.belongs_to.name
                        ),
                        def.belongs_to.span,
                    )
                    .with_hint(format!("Change the line to 'belongs to: {folder}' or move the file.")),
                );
            }

            if let Some(existing) = steps.get(&name) {
                errors.push(
                    located(
                        &source,
                        ErrorCode::DUPLICATE_STEP,
                        format!("Step '{name}' is defined more than once."),
                        def.name.span,
                    )
                    .with_hint(format!("It is also defined in '{}'.", existing.source.name))
                    .with_data("first_definition", existing.source.name.clone()),
                );
                continue;
            }

            steps.insert(
                name,
                StepEntry {
                    floor: folder,
                    def,
                    source,
                },
            );
        }

        for (folder, entry) in &floors {
            for listed in &entry.def.step_names {
                let name = &listed.name;
                let error = match steps.get(name) {
                    Some(step) if step.floor == *folder => continue,
                    Some(step) => located(
                        &entry.source,
                        ErrorCode::FLOOR_STEP_MISSING,
                        format!("Floor '{folder}' lists step '{name}', but '{name}.step' is not in the '{folder}' folder."),
                        listed.span,
                    )
                    .with_hint(format!(
                        "'{name}' is defined in '{}'. Move it into '{folder}/' or remove it from this floor.",
                        step.source.name
                    ))
                    .with_data("found_in", step.floor.clone()),
                    None => located(
                        &entry.source,
                        ErrorCode::FLOOR_STEP_MISSING,
                        format!("Floor '{folder}' lists step '{name}', but no step file defines it."),
                        listed.span,
                    )
                    .with_hint(format!("Create '{folder}/{name}.step'.")),
                };
                errors.push(error);
            }
        }

        let Some((building, building_source)) = self.building else {
            errors.insert(
                0,
                StepsError::new(
                    "<project>",
                    ErrorCode::MISSING_BUILDING,
                    "The project has no building file.",
                    Span::point(1, 1),
                )
                .with_hint("Add a '.building' file that starts with 'building: <name>'."),
            );
            return Err(errors);
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProgramRegistry {
            building,
            building_source,
            floors,
            steps,
        })
    }
}

fn located(source: &SourceFile, code: ErrorCode, message: String, span: Span) -> StepsError {
    StepsError::new(&source.name, code, message, span).with_context(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use steps_types::ast::{Block, Ident};

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::point(1, 1))
    }

    fn building() -> (BuildingDef, SourceFile) {
        let def = BuildingDef {
            name: ident("app"),
            body: Block::new(vec![], Span::point(2, 5)),
            span: Span::point(1, 1),
        };
        (def, SourceFile::new("app.building", "building: app\n"))
    }

    fn floor(name: &str, steps: &[&str]) -> (FloorDef, SourceFile) {
        let def = FloorDef {
            name: ident(name),
            step_names: steps.iter().map(|s| ident(s)).collect(),
            span: Span::point(1, 1),
        };
        (def, SourceFile::new(format!("{name}/{name}.floor"), ""))
    }

    fn step(name: &str, belongs_to: &str) -> (StepDef, SourceFile) {
        let def = StepDef {
            name: ident(name),
            belongs_to: ident(belongs_to),
            parameters: vec![],
            return_decl: None,
            risers: vec![],
            declarations: vec![],
            body: Block::new(vec![], Span::point(3, 9)),
            span: Span::point(1, 1),
        };
        (def, SourceFile::new(format!("{belongs_to}/{name}.step"), ""))
    }

    fn codes(result: Result<ProgramRegistry, Vec<StepsError>>) -> Vec<ErrorCode> {
        match result {
            Ok(_) => vec![],
            Err(errors) => errors.iter().map(|e| e.code).collect(),
        }
    }

    #[test]
    fn test_valid_registry() {
        let (b, bs) = building();
        let (f, fs) = floor("math", &["double"]);
        let (s, ss) = step("double", "math");
        let registry = ProgramRegistry::builder()
            .building(b, bs)
            .floor("math", f, fs)
            .step("math", s, ss)
            .build()
            .unwrap();
        assert_eq!(registry.building().name.name, "app");
        assert_eq!(registry.step("double").unwrap().floor, "math");
        assert_eq!(registry.floor_steps("math"), Some(vec!["double"]));
        assert_eq!(registry.step_names().collect::<Vec<_>>(), vec!["double"]);
    }

    #[test]
    fn test_missing_building() {
        assert_eq!(codes(ProgramRegistry::builder().build()), vec![ErrorCode::MISSING_BUILDING]);
    }

    #[test]
    fn test_step_in_folder_without_floor() {
        let (b, bs) = building();
        let (s, ss) = step("double", "math");
        let result = ProgramRegistry::builder().building(b, bs).step("math", s, ss).build();
        assert_eq!(codes(result), vec![ErrorCode::MISSING_FLOOR]);
    }

    #[test]
    fn test_belongs_to_mismatch() {
        let (b, bs) = building();
        let (f, fs) = floor("math", &["double"]);
        let (s, ss) = step("double", "text");
        let result = ProgramRegistry::builder()
            .building(b, bs)
            .floor("math", f, fs)
            .step("math", s, ss)
            .build();
        assert_eq!(codes(result), vec![ErrorCode::STEP_FLOOR_MISMATCH]);
    }

    #[test]
    fn test_floor_lists_missing_step() {
        let (b, bs) = building();
        let (f, fs) = floor("math", &["double", "halve"]);
        let (s, ss) = step("double", "math");
        let result = ProgramRegistry::builder()
            .building(b, bs)
            .floor("math", f, fs)
            .step("math", s, ss)
            .build();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::FLOOR_STEP_MISSING);
        assert!(errors[0].message.contains("halve"));
    }

    #[test]
    fn test_floor_lists_step_from_another_folder() {
        let (b, bs) = building();
        let (a, a_src) = floor("a", &["greet"]);
        let (f, fs) = floor("b", &["greet"]);
        let (s, ss) = step("greet", "b");
        let errors = ProgramRegistry::builder()
            .building(b, bs)
            .floor("a", a, a_src)
            .floor("b", f, fs)
            .step("b", s, ss)
            .build()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::FLOOR_STEP_MISSING);
        assert_eq!(errors[0].file, "a/a.floor");
        assert!(errors[0].hint.as_deref().unwrap().contains("b/greet.step"));
    }

    #[test]
    fn test_duplicate_step_names() {
        let (b, bs) = building();
        let (f, fs) = floor("math", &["double"]);
        let (g, gs) = floor("more", &["double"]);
        let (s1, ss1) = step("double", "math");
        let (s2, ss2) = step("double", "more");
        let result = ProgramRegistry::builder()
            .building(b, bs)
            .floor("math", f, fs)
            .floor("more", g, gs)
            .step("math", s1, ss1)
            .step("more", s2, ss2)
            .build();
        let errors = result.unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::DUPLICATE_STEP);
        assert_eq!(errors[0].file, "more/double.step");
    }
}
