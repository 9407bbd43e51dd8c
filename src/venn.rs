use anyhow::{anyhow, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;

// matplotlib-venn pastel set, kept for continuity of the figures
const SET_COLORS: [RGBColor; 3] = [
    RGBColor(0x80, 0xB1, 0xD3),
    RGBColor(0xFD, 0xB4, 0x62),
    RGBColor(0xB3, 0xDE, 0x68),
];

const CELL_W: u32 = 300;
const CELL_H: u32 = 300;

/// Exclusive regions of a two-set comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Venn2 {
    pub only_a: usize,
    pub only_b: usize,
    pub both: usize,
}

pub fn venn2_regions<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> Venn2 {
    let both = a.intersection(b).count();
    Venn2 {
        only_a: a.len() - both,
        only_b: b.len() - both,
        both,
    }
}

/// Exclusive regions of a three-set comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Venn3 {
    pub only_a: usize,
    pub only_b: usize,
    pub only_c: usize,
    pub ab: usize,
    pub ac: usize,
    pub bc: usize,
    pub abc: usize,
}

pub fn venn3_regions<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>, c: &HashSet<T>) -> Venn3 {
    let abc = a.iter().filter(|x| b.contains(x) && c.contains(x)).count();
    let ab = a.iter().filter(|x| b.contains(x)).count() - abc;
    let ac = a.iter().filter(|x| c.contains(x)).count() - abc;
    let bc = b.iter().filter(|x| c.contains(x)).count() - abc;
    Venn3 {
        only_a: a.len() - ab - ac - abc,
        only_b: b.len() - ab - bc - abc,
        only_c: c.len() - ac - bc - abc,
        ab,
        ac,
        bc,
        abc,
    }
}

/// One panel of the comparison figure.
#[derive(Debug, Clone)]
pub enum VennPanel {
    Two {
        title: String,
        labels: [String; 2],
        regions: Venn2,
    },
    Three {
        title: String,
        labels: [String; 3],
        regions: Venn3,
    },
}

/// One figure row: the six panels belonging to a domain.
#[derive(Debug, Clone)]
pub struct VennRow {
    pub domain: String,
    pub panels: Vec<VennPanel>,
}

fn plot_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow!("venn figure: {}", e)
}

fn centered(size: f64) -> TextStyle<'static> {
    TextStyle::from(("sans-serif", size).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center))
}

fn draw_circle<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    center: (i32, i32),
    radius: i32,
    color: &RGBColor,
) -> Result<()> {
    area.draw(&Circle::new(center, radius, color.mix(0.6).filled()))
        .map_err(plot_err)?;
    area.draw(&Circle::new(center, radius, color.stroke_width(1)))
        .map_err(plot_err)?;
    Ok(())
}

fn draw_count<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    pos: (i32, i32),
    count: usize,
) -> Result<()> {
    area.draw(&Text::new(count.to_string(), pos, centered(13.0)))
        .map_err(plot_err)
}

fn draw_label<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    pos: (i32, i32),
    label: &str,
) -> Result<()> {
    area.draw(&Text::new(label.to_string(), pos, centered(14.0)))
        .map_err(plot_err)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    panel: &VennPanel,
) -> Result<()> {
    match panel {
        VennPanel::Two {
            title,
            labels,
            regions,
        } => {
            area.draw(&Text::new(title.clone(), (150, 20), centered(15.0)))
                .map_err(plot_err)?;
            draw_circle(area, (115, 150), 72, &SET_COLORS[0])?;
            draw_circle(area, (185, 150), 72, &SET_COLORS[1])?;
            draw_count(area, (85, 150), regions.only_a)?;
            draw_count(area, (150, 150), regions.both)?;
            draw_count(area, (215, 150), regions.only_b)?;
            draw_label(area, (90, 245), &labels[0])?;
            draw_label(area, (210, 245), &labels[1])?;
        }
        VennPanel::Three {
            title,
            labels,
            regions,
        } => {
            area.draw(&Text::new(title.clone(), (150, 20), centered(15.0)))
                .map_err(plot_err)?;
            draw_circle(area, (118, 125), 65, &SET_COLORS[0])?;
            draw_circle(area, (182, 125), 65, &SET_COLORS[1])?;
            draw_circle(area, (150, 180), 65, &SET_COLORS[2])?;
            draw_count(area, (95, 105), regions.only_a)?;
            draw_count(area, (205, 105), regions.only_b)?;
            draw_count(area, (150, 215), regions.only_c)?;
            draw_count(area, (150, 95), regions.ab)?;
            draw_count(area, (112, 160), regions.ac)?;
            draw_count(area, (188, 160), regions.bc)?;
            draw_count(area, (150, 140), regions.abc)?;
            draw_label(area, (60, 60), &labels[0])?;
            draw_label(area, (240, 60), &labels[1])?;
            draw_label(area, (150, 262), &labels[2])?;
        }
    }
    Ok(())
}

/// Render the full comparison figure, one row of panels per domain.
pub fn render_grid(path: &Path, rows: &[VennRow]) -> Result<()> {
    let ncols = rows.iter().map(|r| r.panels.len()).max().unwrap_or(0);
    if ncols == 0 {
        return Err(anyhow!("no venn panels to draw"));
    }
    let width = CELL_W * ncols as u32;
    let height = CELL_H * rows.len() as u32;

    let root = SVGBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let cells = root.split_evenly((rows.len(), ncols));
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, panel) in row.panels.iter().enumerate() {
            draw_panel(&cells[row_idx * ncols + col_idx], panel)?;
        }
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// `domain` capitalized the way the panel titles want it.
pub fn title_case(domain: &str) -> String {
    let mut chars = domain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn two_set_regions_sum_to_cardinalities() {
        let a = set(&["1", "2", "3"]);
        let b = set(&["3", "4"]);
        let v = venn2_regions(&a, &b);
        assert_eq!(v, Venn2 { only_a: 2, only_b: 1, both: 1 });
        assert_eq!(v.only_a + v.both, a.len());
        assert_eq!(v.only_b + v.both, b.len());
    }

    #[test]
    fn three_set_regions_partition_the_union() {
        let a = set(&["1", "2", "3", "7"]);
        let b = set(&["2", "3", "4", "7"]);
        let c = set(&["3", "5", "7"]);
        let v = venn3_regions(&a, &b, &c);
        assert_eq!(v.abc, 2); // "3" and "7"
        assert_eq!(v.ab, 1); // "2"
        assert_eq!(v.only_a + v.ab + v.ac + v.abc, a.len());
        assert_eq!(v.only_b + v.ab + v.bc + v.abc, b.len());
        assert_eq!(v.only_c + v.ac + v.bc + v.abc, c.len());
        let union: HashSet<_> = a.union(&b).chain(a.union(&c)).collect();
        assert_eq!(
            v.only_a + v.only_b + v.only_c + v.ab + v.ac + v.bc + v.abc,
            union.len()
        );
    }

    #[test]
    fn grid_renders_to_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venn.svg");
        let rows = vec![VennRow {
            domain: "viral".into(),
            panels: vec![
                VennPanel::Two {
                    title: "Viral accession".into(),
                    labels: ["RefSeq".into(), "GenBank".into()],
                    regions: Venn2 { only_a: 10, only_b: 5, both: 3 },
                },
                VennPanel::Three {
                    title: "Viral taxid".into(),
                    labels: ["RefSeq".into(), "GenBank".into(), "Representative".into()],
                    regions: Venn3 {
                        only_a: 1,
                        only_b: 2,
                        only_c: 0,
                        ab: 3,
                        ac: 1,
                        bc: 0,
                        abc: 4,
                    },
                },
            ],
        }];
        render_grid(&path, &rows).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn titles_capitalize_domain() {
        assert_eq!(title_case("viral"), "Viral");
        assert_eq!(title_case("vertebrate_other"), "Vertebrate_other");
    }
}
