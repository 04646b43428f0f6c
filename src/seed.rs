//! 演示数据
//!
//! 空库时导入几组固定的卡片包，便于手动试用。

use crate::storage::{CardPack, StorageManager, StorageResult};

/// 静态卡片包，`module` 为 `None` 时只导入卡片
struct StubPack {
    category: &'static str,
    language: &'static str,
    module: Option<&'static str>,
    cards: &'static [(&'static str, &'static str)],
}

const STUB_PACKS: &[StubPack] = &[
    StubPack {
        category: "Spanish basics",
        language: "Spanish",
        module: Some("Greetings"),
        cards: &[
            ("hola", "hello"),
            ("adiós", "goodbye"),
            ("buenos días", "good morning"),
            ("gracias", "thank you"),
        ],
    },
    StubPack {
        category: "Spanish basics",
        language: "Spanish",
        module: Some("Numbers"),
        cards: &[("uno", "one"), ("dos", "two"), ("tres", "three")],
    },
    StubPack {
        category: "German verbs",
        language: "German",
        module: Some("Movement"),
        cards: &[
            ("gehen", "to go"),
            ("laufen", "to run"),
            ("fahren", "to drive"),
        ],
    },
    StubPack {
        category: "German verbs",
        language: "German",
        module: None,
        cards: &[("sein", "to be"), ("haben", "to have")],
    },
];

/// 向空库导入演示卡片包，返回导入的包数
///
/// 已有分类时不做任何写入，返回 0。
pub fn seed_stub_data(storage: &StorageManager) -> StorageResult<usize> {
    if !storage.is_categories_empty()? {
        tracing::debug!("categories already present, skipping stub data");
        return Ok(0);
    }

    let mut imported = 0;
    for stub in STUB_PACKS {
        let pack = CardPack::new(
            stub.category,
            stub.language,
            stub.module.map(str::to_string),
            stub.cards
                .iter()
                .map(|(front, back)| (front.to_string(), back.to_string()))
                .collect(),
        );

        if storage.insert_card_pack(&pack, true)? {
            imported += 1;
        } else {
            tracing::warn!(category = stub.category, "stub pack was not applied");
        }
    }

    tracing::info!(packs = imported, "seeded stub data");
    Ok(imported)
}
