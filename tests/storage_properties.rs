//! 存储管理器行为测试
//!
//! - 导入时按名称复用已有分类
//! - 追加模式按 ID 合并模块成员，覆盖模式替换成员
//! - 尚无进度时"只看未掌握"退回到全部成员
//! - 正面或背面的子串搜索
//! - 被拒绝的卡片包不写入任何数据

use std::collections::BTreeSet;

use flexicards::storage::{Card, CardPack, Category, Module, ProgressSource};
use flexicards::{StorageError, StorageManager, StudySession};

// ============================================================================
// 辅助函数
// ============================================================================

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(front, back)| (front.to_string(), back.to_string()))
        .collect()
}

fn pack(
    category: &str,
    language: Option<&str>,
    module: Option<&str>,
    cards: &[(&str, &str)],
) -> CardPack {
    CardPack {
        category_name: Some(category.to_string()),
        language: language.map(str::to_string),
        module_name: module.map(str::to_string),
        card_list: pairs(cards),
    }
}

fn row_counts(storage: &StorageManager) -> (i64, i64, i64) {
    let conn = storage.get_connection().unwrap();
    let count = |table: &str| -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    };
    (count("categories"), count("cards"), count("modules"))
}

fn as_set(ids: &[i64]) -> BTreeSet<i64> {
    ids.iter().copied().collect()
}

// ============================================================================
// 导入：分类解析
// ============================================================================

#[test]
fn import_reuses_category_with_same_name() {
    let storage = StorageManager::in_memory().unwrap();

    assert!(storage
        .insert_card_pack(&pack("Spanish", Some("es"), None, &[("hola", "hello")]), false)
        .unwrap());
    assert!(storage
        .insert_card_pack(&pack("Spanish", Some("es"), None, &[("adios", "goodbye")]), false)
        .unwrap());

    let categories = storage.get_categories().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(storage.count_cards(categories[0].id).unwrap(), 2);
}

#[test]
fn import_into_existing_category_does_not_need_language() {
    let storage = StorageManager::in_memory().unwrap();
    storage.create_category(&Category::new("German", "de")).unwrap();

    let applied = storage
        .insert_card_pack(&pack("German", None, Some("Verbs"), &[("gehen", "to go")]), false)
        .unwrap();

    assert!(applied);
    let category = storage.find_category_by_name("German").unwrap().unwrap();
    assert_eq!(category.language, "de");
    assert_eq!(storage.get_modules(category.id).unwrap().len(), 1);
}

#[test]
fn import_without_module_only_adds_cards() {
    let storage = StorageManager::in_memory().unwrap();

    let applied = storage
        .insert_card_pack(&pack("Spanish", Some("es"), None, &[("uno", "one"), ("dos", "two")]), true)
        .unwrap();

    assert!(applied);
    assert_eq!(row_counts(&storage), (1, 2, 0));
}

// ============================================================================
// 导入：模块成员合并
// ============================================================================

fn seed_module_with_three_cards(storage: &StorageManager) -> Vec<i64> {
    storage
        .insert_card_pack(
            &pack(
                "Spanish",
                Some("es"),
                Some("Basics"),
                &[("uno", "one"), ("dos", "two"), ("tres", "three")],
            ),
            false,
        )
        .unwrap();
    storage
        .find_module_by_name("Basics")
        .unwrap()
        .unwrap()
        .card_ids
}

#[test]
fn append_unions_membership() {
    let storage = StorageManager::in_memory().unwrap();
    let previous = seed_module_with_three_cards(&storage);
    assert_eq!(previous.len(), 3);

    let applied = storage
        .insert_card_pack(
            &pack("Spanish", Some("es"), Some("Basics"), &[("cuatro", "four"), ("cinco", "five")]),
            true,
        )
        .unwrap();
    assert!(applied);

    let module = storage.find_module_by_name("Basics").unwrap().unwrap();
    assert_eq!(module.card_ids.len(), 5);
    assert!(as_set(&previous).is_subset(&as_set(&module.card_ids)));
    assert_eq!(row_counts(&storage), (1, 5, 1));
}

#[test]
fn overwrite_replaces_membership_but_keeps_cards() {
    let storage = StorageManager::in_memory().unwrap();
    let previous = seed_module_with_three_cards(&storage);

    storage
        .insert_card_pack(
            &pack("Spanish", Some("es"), Some("Basics"), &[("cuatro", "four"), ("cinco", "five")]),
            false,
        )
        .unwrap();

    let module = storage.find_module_by_name("Basics").unwrap().unwrap();
    assert_eq!(module.card_ids.len(), 2);
    assert!(as_set(&previous).is_disjoint(&as_set(&module.card_ids)));

    // 旧卡片仍在分类中
    let dictionary = storage.get_dictionary(module.category_id).unwrap();
    assert_eq!(dictionary.len(), 5);
    assert_eq!(row_counts(&storage), (1, 5, 1));
}

#[test]
fn append_unions_by_id_not_by_content() {
    let storage = StorageManager::in_memory().unwrap();
    seed_module_with_three_cards(&storage);

    storage
        .insert_card_pack(&pack("Spanish", Some("es"), Some("Basics"), &[("uno", "one!")]), true)
        .unwrap();

    let module = storage.find_module_by_name("Basics").unwrap().unwrap();
    assert_eq!(module.card_ids.len(), 4);
    let fronts: Vec<String> = storage
        .get_module_cards(module.id, false, false)
        .unwrap()
        .cards
        .into_iter()
        .map(|c| c.front)
        .collect();
    assert_eq!(fronts.iter().filter(|f| f.as_str() == "uno").count(), 2);
}

#[test]
fn merge_updates_the_module_row_not_the_category_row() {
    let storage = StorageManager::in_memory().unwrap();
    // 让分类 ID 与模块 ID 不同
    storage.create_category(&Category::new("Filler", "xx")).unwrap();
    storage.create_category(&Category::new("Filler 2", "xx")).unwrap();
    storage
        .create_module(&Module::new(99, "Unrelated", vec![]))
        .unwrap();

    seed_module_with_three_cards(&storage);
    let before = storage.find_module_by_name("Basics").unwrap().unwrap();
    let category = storage.find_category_by_name("Spanish").unwrap().unwrap();
    assert_ne!(before.id, category.id);

    storage
        .insert_card_pack(&pack("Spanish", Some("es"), Some("Basics"), &[("seis", "six")]), true)
        .unwrap();

    let after = storage.find_module_by_name("Basics").unwrap().unwrap();
    assert_eq!(after.card_ids.len(), 4);
    let unrelated = storage.find_module_by_name("Unrelated").unwrap().unwrap();
    assert!(unrelated.card_ids.is_empty());
}

// ============================================================================
// 进度与退回
// ============================================================================

#[test]
fn fresh_module_falls_back_to_all_cards() {
    let storage = StorageManager::in_memory().unwrap();
    seed_module_with_three_cards(&storage);
    let module = storage.find_module_by_name("Basics").unwrap().unwrap();

    let all = storage.get_module_cards(module.id, false, false).unwrap();
    let unanswered = storage.get_module_cards(module.id, false, true).unwrap();

    assert_eq!(all.progress, ProgressSource::Recorded);
    assert!(unanswered.is_fallback());
    assert_eq!(all.cards, unanswered.cards);
}

#[test]
fn recorded_progress_is_returned_exactly() {
    let storage = StorageManager::in_memory().unwrap();
    let ids = seed_module_with_three_cards(&storage);
    let module = storage.find_module_by_name("Basics").unwrap().unwrap();

    storage
        .update_module_progress(module.id, &[ids[1], ids[2]])
        .unwrap();

    let unanswered = storage.get_module_cards(module.id, false, true).unwrap();
    assert_eq!(unanswered.progress, ProgressSource::Recorded);
    assert_eq!(as_set(&unanswered.card_ids()), as_set(&[ids[1], ids[2]]));

    // 成员列表不受影响
    let all = storage.get_module_cards(module.id, false, false).unwrap();
    assert_eq!(all.cards.len(), 3);
}

#[test]
fn all_answered_returns_empty_without_fallback() {
    let storage = StorageManager::in_memory().unwrap();
    seed_module_with_three_cards(&storage);
    let module = storage.find_module_by_name("Basics").unwrap().unwrap();

    storage.update_module_progress(module.id, &[]).unwrap();

    let unanswered = storage.get_module_cards(module.id, false, true).unwrap();
    assert!(unanswered.cards.is_empty());
    assert!(!unanswered.is_fallback());
}

#[test]
fn module_cards_are_sorted_by_front_unless_random() {
    let storage = StorageManager::in_memory().unwrap();
    storage
        .insert_card_pack(
            &pack("Spanish", Some("es"), Some("Animals"), &[("zorro", "fox"), ("Abeja", "bee"), ("gato", "cat")]),
            false,
        )
        .unwrap();
    let module = storage.find_module_by_name("Animals").unwrap().unwrap();

    let sorted: Vec<String> = storage
        .get_module_cards(module.id, false, false)
        .unwrap()
        .cards
        .into_iter()
        .map(|c| c.front)
        .collect();
    assert_eq!(sorted, vec!["Abeja", "gato", "zorro"]);

    let random = storage.get_module_cards(module.id, true, false).unwrap();
    assert_eq!(as_set(&random.card_ids()), as_set(&module.card_ids));
}

#[test]
fn accented_fronts_sort_with_their_base_letter() {
    let storage = StorageManager::in_memory().unwrap();
    storage
        .insert_card_pack(
            &pack(
                "Spanish",
                Some("es"),
                Some("Words"),
                &[("zorro", "fox"), ("ábaco", "abacus"), ("élite", "elite"), ("fuego", "fire")],
            ),
            false,
        )
        .unwrap();
    let category = storage.find_category_by_name("Spanish").unwrap().unwrap();
    let module = storage.find_module_by_name("Words").unwrap().unwrap();
    let expected = vec!["ábaco", "élite", "fuego", "zorro"];

    let dictionary: Vec<String> = storage
        .get_dictionary(category.id)
        .unwrap()
        .into_iter()
        .map(|c| c.front)
        .collect();
    assert_eq!(dictionary, expected);

    let module_cards: Vec<String> = storage
        .get_module_cards(module.id, false, false)
        .unwrap()
        .cards
        .into_iter()
        .map(|c| c.front)
        .collect();
    assert_eq!(module_cards, expected);
}

#[test]
fn module_larger_than_sqlite_variable_limit_is_readable() {
    const CARD_COUNT: usize = 33_000;

    let storage = StorageManager::in_memory().unwrap();
    let cards: Vec<(String, String)> = (0..CARD_COUNT)
        .map(|i| (format!("front {:05}", i), format!("back {}", i)))
        .collect();
    storage
        .insert_card_pack(&CardPack::new("Bulk", "en", Some("All".to_string()), cards), false)
        .unwrap();
    let module = storage.find_module_by_name("All").unwrap().unwrap();
    assert_eq!(module.card_ids.len(), CARD_COUNT);

    let loaded = storage.get_module_cards(module.id, false, false).unwrap();
    assert_eq!(loaded.cards.len(), CARD_COUNT);
    assert_eq!(loaded.cards[0].front, "front 00000");
    assert_eq!(loaded.cards[CARD_COUNT - 1].front, "front 32999");

    storage
        .update_module_progress(module.id, &module.card_ids)
        .unwrap();
    let unanswered = storage.get_module_cards(module.id, true, true).unwrap();
    assert!(!unanswered.is_fallback());
    assert_eq!(unanswered.cards.len(), CARD_COUNT);
}

#[test]
fn study_session_round_trip() {
    let storage = StorageManager::in_memory().unwrap();
    seed_module_with_three_cards(&storage);
    let module = storage.find_module_by_name("Basics").unwrap().unwrap();

    let mut session = StudySession::start(&storage, module.id, false, true).unwrap();
    assert!(session.is_fallback());
    let missed = session.current().unwrap().id;
    session.answer(false).unwrap();
    session.answer(true).unwrap();
    session.answer(true).unwrap();

    let summary = session.finish();
    assert_eq!(summary.unanswered, vec![missed]);
    storage.complete_session(&summary).unwrap();

    let next = StudySession::start(&storage, module.id, false, true).unwrap();
    assert!(!next.is_fallback());
    assert_eq!(next.total(), 1);
    assert_eq!(next.current().unwrap().id, missed);
}

// ============================================================================
// 搜索
// ============================================================================

#[test]
fn substring_search_over_front_and_back() {
    let storage = StorageManager::in_memory().unwrap();
    storage
        .insert_card_pack(&pack("Spanish", Some("es"), None, &[("hola", "hello"), ("adios", "goodbye")]), false)
        .unwrap();
    let category = storage.find_category_by_name("Spanish").unwrap().unwrap();

    let hits = storage.filter_dictionary(category.id, "o").unwrap();
    let fronts: Vec<&str> = hits.iter().map(|c| c.front.as_str()).collect();
    assert_eq!(fronts, vec!["adios", "hola"]);

    assert!(storage.filter_dictionary(category.id, "xyz").unwrap().is_empty());
    assert_eq!(storage.filter_dictionary(category.id, "GOOD").unwrap().len(), 1);
}

#[test]
fn search_is_scoped_to_category() {
    let storage = StorageManager::in_memory().unwrap();
    storage
        .insert_card_pack(&pack("Spanish", Some("es"), None, &[("hola", "hello")]), false)
        .unwrap();
    storage
        .insert_card_pack(&pack("Italian", Some("it"), None, &[("ciao", "hello")]), false)
        .unwrap();
    let spanish = storage.find_category_by_name("Spanish").unwrap().unwrap();

    let hits = storage.filter_dictionary(spanish.id, "hello").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].front, "hola");
}

// ============================================================================
// 参数校验
// ============================================================================

#[test]
fn pack_without_category_name_is_rejected_without_writes() {
    let storage = StorageManager::in_memory().unwrap();
    let mut bad = pack("ignored", Some("es"), Some("Basics"), &[("hola", "hello")]);
    bad.category_name = None;

    let result = storage.insert_card_pack(&bad, false);

    assert!(matches!(result, Err(StorageError::Validation(_))));
    assert_eq!(row_counts(&storage), (0, 0, 0));
}

#[test]
fn new_category_without_language_is_rejected_without_writes() {
    let storage = StorageManager::in_memory().unwrap();

    let result = storage.insert_card_pack(&pack("Spanish", None, Some("Basics"), &[("hola", "hello")]), true);

    assert!(matches!(result, Err(StorageError::Validation(_))));
    assert_eq!(row_counts(&storage), (0, 0, 0));
    assert!(storage.is_categories_empty().unwrap());
    assert!(storage.is_cards_empty().unwrap());
}

// ============================================================================
// 悬空引用
// ============================================================================

#[test]
fn cards_with_missing_category_do_not_break_lookups() {
    let storage = StorageManager::in_memory().unwrap();
    storage.create_card(&Card::new(404, "perdido", "lost")).unwrap();

    assert!(storage.find_card("perdido").unwrap());
    assert_eq!(storage.get_dictionary(404).unwrap().len(), 1);
    assert!(storage.get_categories().unwrap().is_empty());
}
