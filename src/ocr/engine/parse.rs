use anyhow::{anyhow, Result};
use std::collections::HashMap;

use crate::ocr::{BBoxPx, TextFragment};

use super::geom::union_bbox;

const TSV_COLUMNS: usize = 12;
const WORD_LEVEL: i32 = 5;

#[derive(Clone)]
struct WordToken {
    text: String,
    bbox: BBoxPx,
    conf: f32,
}

/// Groups tesseract TSV word rows into one fragment per text line.
///
/// Lines come out in the order their first word appears in the TSV.
pub(super) fn parse_tsv_fragments(tsv: &str) -> Result<Vec<TextFragment>> {
    let mut rows = tsv.lines();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    if header.split('\t').count() < TSV_COLUMNS {
        return Err(anyhow!("unexpected tesseract tsv header: {}", header.trim()));
    }

    let mut order: Vec<(i32, i32, i32, i32)> = Vec::new();
    let mut word_map: HashMap<(i32, i32, i32, i32), Vec<WordToken>> = HashMap::new();

    for row in rows {
        // text may contain tabs only as the final column
        let cols = row.splitn(TSV_COLUMNS, '\t').collect::<Vec<_>>();
        if cols.len() < TSV_COLUMNS {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let page_num: i32 = cols[1].parse().unwrap_or(0);
        let block_num: i32 = cols[2].parse().unwrap_or(0);
        let par_num: i32 = cols[3].parse().unwrap_or(0);
        let line_num: i32 = cols[4].parse().unwrap_or(0);
        let left: u32 = cols[6].parse().unwrap_or(0);
        let top: u32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (page_num, block_num, par_num, line_num);
        let words = word_map.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        words.push(WordToken {
            text: text.to_string(),
            bbox: BBoxPx {
                x: left,
                y: top,
                w: width,
                h: height,
            },
            conf,
        });
    }

    Ok(order
        .iter()
        .filter_map(|key| word_map.remove(key))
        .filter_map(|words| build_fragment(&words))
        .collect())
}

fn build_fragment(words: &[WordToken]) -> Option<TextFragment> {
    let first = words.first()?;
    let text = words
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let bbox = words
        .iter()
        .skip(1)
        .fold(first.bbox.clone(), |acc, word| union_bbox(&acc, &word.bbox));
    let conf_sum: f32 = words.iter().map(|word| word.conf).sum();
    let conf = (conf_sum / words.len() as f32 / 100.0).clamp(0.0, 1.0);

    Some(TextFragment { text, conf, bbox })
}
