//! Configuration loader
//!
//! Builds an [`Animation`] from the custom data of the program block and of
//! every block reachable through `definitions`. Loading is all-or-nothing:
//! either every segment is built or an error is returned and nothing is.

use crate::error::{Error, Result};
use crate::settings::{definitions, Settings, CONTROL_SECTION};
use animatron_core::step::TriggerStep;
use animatron_core::{
    Animation, BlockDirectory, BlockRef, ConfigStore, Mode, Segment, Step, TriggerSet,
};
use indexmap::IndexMap;

/// Step tag that inlines another mode's steps
pub const INCLUDE_TAG: &str = "INCLUDE";

/// Everything a program needs after setup
#[derive(Debug, Clone)]
pub struct Setup {
    pub settings: Settings,
    pub animation: Animation,
}

/// One configuration blob and the block it came from
#[derive(Debug)]
struct Source {
    name: String,
    config: ConfigStore,
}

/// Loader for animation configuration
pub struct Loader<'a> {
    directory: &'a dyn BlockDirectory,
}

impl<'a> Loader<'a> {
    /// Create a loader resolving blocks through `directory`
    pub fn new(directory: &'a dyn BlockDirectory) -> Self {
        Self { directory }
    }

    /// Load settings and animation, starting from the program block `me`
    pub fn load(&self, me: &BlockRef) -> Result<Setup> {
        log::info!("loading animation from {}", me.name());

        let own = ConfigStore::parse(&me.custom_data());
        let settings = Settings::from_config(&own);

        let sources = self.collect_sources(me)?;
        let merged = merge_sources(&sources)?;
        let animation = self.build_animation(&merged)?;

        log::info!(
            "loaded {} segments from {} configuration blocks",
            animation.len(),
            sources.len()
        );
        Ok(Setup {
            settings,
            animation,
        })
    }

    /// Load only the animation from configuration text
    pub fn load_text(&self, text: &str) -> Result<Animation> {
        let merged = merge_sources(&[Source {
            name: String::new(),
            config: ConfigStore::parse(text),
        }])?;
        self.build_animation(&merged)
    }

    // === Definitions chain ===

    fn collect_sources(&self, me: &BlockRef) -> Result<Vec<Source>> {
        let mut sources = Vec::new();
        let mut visited: Vec<BlockRef> = Vec::new();
        let mut path: Vec<BlockRef> = Vec::new();
        self.visit(me.clone(), &mut path, &mut visited, &mut sources)?;
        Ok(sources)
    }

    fn visit(
        &self,
        block: BlockRef,
        path: &mut Vec<BlockRef>,
        visited: &mut Vec<BlockRef>,
        sources: &mut Vec<Source>,
    ) -> Result<()> {
        if let Some(start) = path.iter().position(|entry| entry.same_block(&block)) {
            let mut chain: Vec<String> = path[start..].iter().map(|entry| entry.name()).collect();
            chain.push(block.name());
            return Err(Error::CircularDefinition {
                chain: chain.join(" -> "),
            });
        }
        if visited.iter().any(|entry| entry.same_block(&block)) {
            return Ok(());
        }

        let config = ConfigStore::parse(&block.custom_data());
        let children = definitions(&config);
        visited.push(block.clone());
        sources.push(Source {
            name: block.name(),
            config,
        });

        path.push(block);
        for name in children {
            match self.directory.block_with_name(&name) {
                Some(child) => self.visit(child, path, visited, sources)?,
                None => log::warn!("definitions block '{name}' not found"),
            }
        }
        path.pop();
        Ok(())
    }

    // === Animation ===

    fn build_animation(&self, merged: &ConfigStore) -> Result<Animation> {
        let segments = group_sections(merged)?;

        let mut built = Vec::with_capacity(segments.len());
        for (segment, modes) in &segments {
            let mut built_modes = Vec::with_capacity(modes.len());
            for mode in modes {
                built_modes.push(self.build_mode(merged, segment, mode)?);
            }
            built.push(Segment::new(segment.as_str(), built_modes));
        }

        for segment in &built {
            for mode in segment.modes() {
                validate_jumps(&segments, mode)?;
            }
        }

        Ok(built.into_iter().collect())
    }

    fn build_mode(&self, config: &ConfigStore, segment: &str, mode: &str) -> Result<Mode> {
        let section = section_name(segment, mode);
        let lines = expand_steps(config, segment, mode)?;
        let steps = Step::parse_all(lines.iter().map(String::as_str), self.directory)?;
        let triggers = TriggerSet::parse(config.get_or(&section, "triggers", ""))?;
        let repeat = config.get_bool(&section, "repeat", false);
        let priority = config.get_i32(&section, "priority", 0);

        log::debug!(
            "built {section}: {} steps, priority {priority}, repeat {repeat}",
            steps.len()
        );
        Ok(Mode::new(mode, triggers, repeat, priority, steps)?)
    }
}

fn section_name(segment: &str, mode: &str) -> String {
    format!("{segment}.{mode}")
}

/// Combine every source into one store, rejecting repeated mode sections
fn merge_sources(sources: &[Source]) -> Result<ConfigStore> {
    let mut merged = ConfigStore::new();
    for source in sources {
        for section in source.config.sections() {
            if section == CONTROL_SECTION {
                continue;
            }
            if merged.has_section(section) {
                return Err(Error::DuplicateDefinition(section.to_string()));
            }
            let Some(keys) = source.config.section(section) else {
                continue;
            };
            log::trace!("[{section}] from {}", source.name);
            for (key, value) in keys {
                merged.set(section, key, value.as_str());
            }
            if keys.is_empty() {
                merged.set(section, "steps", "");
            }
        }
    }
    Ok(merged)
}

/// Group `segment.mode` sections by segment, keeping declaration order
fn group_sections(config: &ConfigStore) -> Result<IndexMap<String, Vec<String>>> {
    let mut segments: IndexMap<String, Vec<String>> = IndexMap::new();
    for section in config.sections() {
        let Some((segment, mode)) = section.split_once('.') else {
            return Err(Error::InvalidSection(section.to_string()));
        };
        if segment.is_empty() || mode.is_empty() {
            return Err(Error::InvalidSection(section.to_string()));
        }
        segments
            .entry(segment.to_string())
            .or_default()
            .push(mode.to_string());
    }
    Ok(segments)
}

/// Step lines of a mode with comments dropped and includes inlined
fn expand_steps(config: &ConfigStore, segment: &str, mode: &str) -> Result<Vec<String>> {
    let start = section_name(segment, mode);
    let mut stack = vec![start.clone()];
    let mut lines = Vec::new();
    expand_into(config, &start, &start, None, &mut stack, &mut lines)?;
    Ok(lines)
}

fn expand_into(
    config: &ConfigStore,
    section: &str,
    start: &str,
    top_level_step: Option<&str>,
    stack: &mut Vec<String>,
    lines: &mut Vec<String>,
) -> Result<()> {
    let steps = config.get_or(section, "steps", "");
    for raw in steps.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('-') {
            continue;
        }

        let tag = line.split(';').next().unwrap_or_default();
        if !tag.trim().eq_ignore_ascii_case(INCLUDE_TAG) {
            lines.push(line.to_string());
            continue;
        }

        let fields = animatron_core::token::split_fields(line, 3)?;
        let target = section_name(fields[1], fields[2]);
        let reported_step = top_level_step.unwrap_or(line);
        if stack.contains(&target) {
            return Err(Error::CircularInclusion {
                start: start.to_string(),
                step: reported_step.to_string(),
            });
        }
        if !config.has_section(&target) {
            return Err(Error::UnknownMode {
                segment: fields[1].to_string(),
                mode: fields[2].to_string(),
                line: line.to_string(),
            });
        }

        stack.push(target.clone());
        expand_into(config, &target, start, Some(reported_step), stack, lines)?;
        stack.pop();
    }
    Ok(())
}

/// Trigger steps must name an existing segment and mode
fn validate_jumps(segments: &IndexMap<String, Vec<String>>, owner: &Mode) -> Result<()> {
    for step in owner.steps() {
        let Step::Trigger(TriggerStep { segment, mode }) = step else {
            continue;
        };
        let known = segments
            .get(segment)
            .is_some_and(|modes| modes.iter().any(|name| name == mode));
        if !known {
            return Err(Error::UnknownMode {
                segment: segment.clone(),
                mode: mode.clone(),
                line: format!("Trigger;{segment};{mode}"),
            });
        }
    }
    Ok(())
}
