use std::collections::HashSet;

use super::{linearize, HeadRule};
use crate::domain::chapter::ChapterRecord;
use crate::numbering::NumberingPatterns;

fn chain(n: usize) -> Vec<ChapterRecord> {
    (1..=n)
        .map(|i| {
            let mut chapter = ChapterRecord::new(&format!("c{i}"), &format!("Chapter {i}"));
            if i > 1 {
                chapter = chapter.with_prev(&format!("c{}", i - 1));
            }
            if i < n {
                chapter = chapter.with_next(&format!("c{}", i + 1));
            }
            chapter
        })
        .collect()
}

#[test]
fn orders_shuffled_three_chapter_example() {
    let input = vec![
        ChapterRecord::new("c2", "Two").with_next("c3").with_prev("c1"),
        ChapterRecord::new("c1", "One").with_next("c2"),
        ChapterRecord::new("c3", "Three").with_prev("c2"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["c1", "c2", "c3"]);
    assert_eq!(sequence.head_rule, HeadRule::NoPrevPointer);
    assert_eq!(sequence.chained, 3);
    assert_eq!(sequence.orphaned, 0);
}

#[test]
fn well_formed_chain_comes_back_in_chain_order() {
    let ordered = chain(40);
    let expected = ordered
        .iter()
        .map(|chapter| chapter.self_id.clone())
        .collect::<Vec<_>>();

    let mut shuffled = ordered;
    shuffled.reverse();
    shuffled.rotate_left(7);

    let sequence = linearize(shuffled, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), expected);
    assert_eq!(sequence.chained, 40);
}

#[test]
fn cycle_back_to_head_truncates_without_looping() {
    let mut input = chain(4);
    input[3].declared_next_id = Some("c2".to_string());

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["c1", "c2", "c3", "c4"]);
    assert!(sequence.chapters.len() <= 4);
}

#[test]
fn fully_cyclic_ring_falls_back_to_input_order_head() {
    let input = vec![
        ChapterRecord::new("b", "B").with_next("c").with_prev("a"),
        ChapterRecord::new("c", "C").with_next("a").with_prev("b"),
        ChapterRecord::new("a", "A").with_next("b").with_prev("c"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.head_rule, HeadRule::InputOrder);
    assert_eq!(sequence.ids(), vec!["b", "c", "a"]);
}

#[test]
fn self_loop_stops_traversal_and_keeps_rest_as_orphans() {
    let input = vec![
        ChapterRecord::new("a", "A").with_next("a"),
        ChapterRecord::new("b", "B").with_prev("a"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["a", "b"]);
    assert_eq!(sequence.chained, 1);
    assert_eq!(sequence.orphaned, 1);
}

#[test]
fn dangling_back_pointer_marks_the_head() {
    let input = vec![
        ChapterRecord::new("c2", "Two").with_prev("c1").with_next("c3"),
        ChapterRecord::new("c1", "One").with_prev("c0-missing").with_next("c2"),
        ChapterRecord::new("c3", "Three").with_prev("c2"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.head_rule, HeadRule::DanglingPrevPointer);
    assert_eq!(sequence.ids(), vec!["c1", "c2", "c3"]);
}

#[test]
fn chapter_never_named_as_next_becomes_head() {
    let input = vec![
        ChapterRecord::new("c3", "Three").with_prev("c2"),
        ChapterRecord::new("c1", "One").with_prev("c3").with_next("c2"),
        ChapterRecord::new("c2", "Two").with_prev("c1").with_next("c3"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.head_rule, HeadRule::NeverNamedAsNext);
    assert_eq!(sequence.ids(), vec!["c1", "c2", "c3"]);
}

#[test]
fn orphans_follow_chain_in_input_order() {
    let input = vec![
        ChapterRecord::new("a", "A").with_next("b"),
        ChapterRecord::new("y", "Y").with_prev("q"),
        ChapterRecord::new("b", "B").with_prev("a"),
        ChapterRecord::new("x", "X").with_prev("p"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["a", "b", "y", "x"]);
    assert_eq!(sequence.chained, 2);
    assert_eq!(sequence.orphaned, 2);
}

#[test]
fn pointers_differing_by_accents_still_link() {
    let input = vec![
        ChapterRecord::new("chuong-2-gap-go", "Gặp gỡ").with_prev("Chương 1: Bắt đầu"),
        ChapterRecord::new("chuong-1-bat-dau", "Bắt đầu").with_next("Chương 2 - Gặp Gỡ"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["chuong-1-bat-dau", "chuong-2-gap-go"]);
    assert_eq!(sequence.chained, 2);
}

#[test]
fn numbered_pointers_fall_back_to_title_numbers() {
    let mut input = vec![
        ChapterRecord::new("p-2", "Chương 2").with_prev("chuong-1"),
        ChapterRecord::new("p-1", "Chương 1").with_next("chuong-2"),
        ChapterRecord::new("p-3", "Chương 3").with_prev("chuong-2"),
    ];
    input[0].declared_next_id = Some("chuong-3".to_string());

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["p-1", "p-2", "p-3"]);
}

#[test]
fn records_without_self_id_are_dropped() {
    let input = vec![
        ChapterRecord::new("", "nameless").with_next("a"),
        ChapterRecord::new("a", "A").with_next("b"),
        ChapterRecord::new("  ", "blank"),
        ChapterRecord::new("b", "B").with_prev("a"),
    ];

    let sequence = linearize(input, &NumberingPatterns::default());
    assert_eq!(sequence.ids(), vec!["a", "b"]);
    assert_eq!(sequence.discarded, 2);
}

#[test]
fn all_blank_ids_return_input_unchanged() {
    let input = vec![ChapterRecord::new("", "first"), ChapterRecord::new(" ", "second")];

    let sequence = linearize(input.clone(), &NumberingPatterns::default());
    assert_eq!(sequence.chapters, input);
    assert_eq!(sequence.head_rule, HeadRule::Unordered);

    let empty = linearize(Vec::new(), &NumberingPatterns::default());
    assert!(empty.chapters.is_empty());
}

#[test]
fn output_is_total_over_messy_inputs() {
    let inputs = vec![
        vec![
            ChapterRecord::new("a", "A").with_next("zzz"),
            ChapterRecord::new("b", "B").with_next("a").with_prev("b"),
            ChapterRecord::new("c", "C").with_prev("nowhere"),
            ChapterRecord::new("", "D"),
        ],
        vec![
            ChapterRecord::new("x", "Chapter 1").with_next("chapter-2").with_prev("x"),
            ChapterRecord::new("y", "Chapter 2").with_next("chapter-1").with_prev("x"),
            ChapterRecord::new("z", "Chapter 2").with_next("y").with_prev("y"),
        ],
        chain(1),
    ];

    for input in inputs {
        let expected = input
            .iter()
            .filter(|chapter| chapter.has_self_id())
            .map(|chapter| chapter.self_id.clone())
            .collect::<HashSet<_>>();
        let valid_count = input.iter().filter(|chapter| chapter.has_self_id()).count();

        let sequence = linearize(input, &NumberingPatterns::default());
        assert_eq!(sequence.chapters.len(), valid_count);
        let seen = sequence
            .chapters
            .iter()
            .map(|chapter| chapter.self_id.clone())
            .collect::<HashSet<_>>();
        assert_eq!(seen, expected);
        assert_eq!(sequence.chained + sequence.orphaned, valid_count);
    }
}
