//! Page list syntax for `pagecraft organize`
//!
//! A comma-separated list of 1-based pages or ranges, each optionally
//! followed by `:<degrees>`: `"3, 1-2:90, 5:270"`. Order is kept as given.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use pagecraft_core::page_model::{ProjectedPage, Rotation};

pub fn parse_pages(input: &str) -> Result<Vec<ProjectedPage>> {
    let mut pages = Vec::new();
    let mut seen = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (range, rotation) = match part.split_once(':') {
            Some((range, degrees)) => (range.trim(), parse_rotation(degrees.trim())?),
            None => (part, Rotation::R0),
        };

        let (start, end) = match range.split_once('-') {
            Some((start, end)) => (parse_page(start)?, parse_page(end)?),
            None => {
                let page = parse_page(range)?;
                (page, page)
            }
        };
        if start > end {
            bail!("Start {} > end {}", start, end);
        }

        for page in start..=end {
            if !seen.insert(page) {
                bail!("Page {} listed twice", page);
            }
            pages.push(ProjectedPage {
                source_index: page - 1,
                rotation,
            });
        }
    }

    if pages.is_empty() {
        bail!("No pages given");
    }
    Ok(pages)
}

fn parse_page(s: &str) -> Result<u32> {
    let page: u32 = s
        .trim()
        .parse()
        .with_context(|| format!("Invalid page: {}", s.trim()))?;
    if page == 0 {
        bail!("Pages are numbered from 1");
    }
    Ok(page)
}

fn parse_rotation(s: &str) -> Result<Rotation> {
    let degrees: i64 = s
        .parse()
        .with_context(|| format!("Invalid rotation: {}", s))?;
    Rotation::from_degrees(degrees)
        .with_context(|| format!("Rotation must be a multiple of 90, got {}", degrees))
}
