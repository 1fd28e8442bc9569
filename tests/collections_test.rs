// collections_test.rs
mod common;

use std::sync::Arc;

use common::test_backend::CountingBackend;
use redis_collections::{
    CollectionConfig, Error, KeyedCollection, ListCollection, MapCollection, MemoryBackend,
    SetCollection, SortedSetCollection, Store, Structure, Value, ValueCollection,
};
use redisstore::{MemoryStore, RedisStore};

fn memory_store() -> Store {
    Store::new(MemoryBackend::new())
}

#[tokio::test]
async fn test_sorted_set_top_with_ties() {
    let store = memory_store();
    let sorted = SortedSetCollection::new("sorted:${id}", 1).unwrap();

    store
        .resolve(Structure::seq([
            sorted.put("n", 1.0, "one").unwrap(),
            sorted.put("n", 2.0, "two").unwrap(),
            sorted.put("n", 1.0, "three").unwrap(),
        ]))
        .await
        .unwrap();

    let top = store.resolve(sorted.get_top("n", 2, false).unwrap()).await.unwrap();
    assert_eq!(top, Value::strings(["two", "three"]));

    let bottom = store
        .resolve(sorted.get_bottom("n", 3, false).unwrap())
        .await
        .unwrap();
    assert_eq!(bottom, Value::strings(["one", "three", "two"]));
}

#[tokio::test]
async fn test_most_recent_equal_score_comes_first() {
    let store = memory_store();
    let sorted = SortedSetCollection::new("board", 0).unwrap();

    store.resolve(sorted.put((), 5.0, "A").unwrap()).await.unwrap();
    store.resolve(sorted.put((), 5.0, "B").unwrap()).await.unwrap();

    let top = store.resolve(sorted.get_top((), 2, true).unwrap()).await.unwrap();
    assert_eq!(top, Value::strings(["B", "5", "A", "5"]));
}

#[tokio::test]
async fn test_sorted_set_scores_and_trimming() {
    let store = memory_store();
    let sorted = SortedSetCollection::new("scores:${board}", 1).unwrap();

    let results = store
        .resolve(Structure::seq([
            sorted.put("w", 1.5, "a").unwrap(),
            sorted.put("w", 3.0, "b").unwrap(),
            sorted.put("w", 10.0, "c").unwrap(),
            sorted.inc("w", 0.25, "a").unwrap(),
            sorted.get_score("w", "a").unwrap(),
            sorted.get_rank("w", "c").unwrap(),
            sorted.get_list_between("w", 1.0, 3.0, false).unwrap(),
            sorted.remove_below("w", 2.0).unwrap(),
            sorted.size("w").unwrap(),
            sorted.get_score("w", "missing").unwrap(),
        ]))
        .await
        .unwrap();
    let results = results.as_list().unwrap();

    assert_eq!(results[3], Value::from("1.75"));
    assert_eq!(results[4], Value::from("1.75"));
    assert_eq!(results[5], Value::Int(2));
    assert_eq!(results[6], Value::strings(["a", "b"]));
    assert_eq!(results[7], Value::Int(1));
    assert_eq!(results[8], Value::Int(2));
    assert_eq!(results[9], Value::Nil);

    // 只保留最高的一个
    store.resolve(sorted.remove_bottom("w", 1).unwrap()).await.unwrap();
    let all = store.resolve(sorted.get_list("w", true).unwrap()).await.unwrap();
    assert_eq!(all, Value::strings(["c", "10"]));
}

#[tokio::test]
async fn test_set_and_map_in_one_batch() {
    let backend = CountingBackend::new();
    let store = Store::new(backend.clone());
    let sets = SetCollection::new("set:${id}", 1).unwrap();

    store.resolve(sets.add("b", "y").unwrap()).await.unwrap();
    backend.reset();

    let resolved = store
        .resolve(Structure::map([
            ("a", Structure::from(sets.contains("a", "x").unwrap())),
            ("b", Structure::from(sets.get_list("b").unwrap())),
        ]))
        .await
        .unwrap();

    assert_eq!(resolved.to_string(), r#"{"a":0,"b":["y"]}"#);
    assert_eq!(backend.batches(), vec![2]);
}

#[tokio::test]
async fn test_map_fields_and_missing_hash() {
    let store = memory_store();
    let users = MapCollection::new(
        CollectionConfig::new("user:${id}").with_fields(["name", "age"]),
        1,
    )
    .unwrap();

    assert!(matches!(
        users.get("U1", "email"),
        Err(Error::FieldNotDeclared(_))
    ));

    let resolved = store
        .resolve(Structure::seq([
            users.set_all("U1", [("name", "Ada"), ("age", "36")]).unwrap(),
            users.get_map("U1").unwrap(),
            users.get_map("U2").unwrap(),
            users.has("U1", "age").unwrap(),
            users.remove("U1", "age").unwrap(),
            users.get_fields("U1").unwrap(),
            users.get("U1", "name").unwrap(),
        ]))
        .await
        .unwrap();

    assert_eq!(
        resolved.to_string(),
        r#"["OK",{"name":"Ada","age":"36"},null,1,1,["name"],"Ada"]"#
    );
}

#[tokio::test]
async fn test_find_keys_and_id_extraction() {
    let store = memory_store();
    let friends = SetCollection::new("user:${id}:friends", 1).unwrap();
    let pairs = ValueCollection::new("pair:${a}:${b}", 2).unwrap();

    store
        .resolve(Structure::seq([
            friends.add("U1", "x").unwrap(),
            friends.add("U2", "y").unwrap(),
            pairs.set(("p", "1"), "v").unwrap(),
            pairs.set(("p", "2"), "v").unwrap(),
            pairs.set(("q", "1"), "v").unwrap(),
        ]))
        .await
        .unwrap();

    let keys = store.resolve(friends.find_keys(()).unwrap()).await.unwrap();
    let mut ids: Vec<String> = keys
        .as_list()
        .unwrap()
        .iter()
        .filter_map(|k| friends.to_id(k.as_str()?))
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["U1", "U2"]);

    let keys = store.resolve(pairs.find_keys("p").unwrap()).await.unwrap();
    let mut found: Vec<Vec<String>> = keys
        .as_list()
        .unwrap()
        .iter()
        .filter_map(|k| pairs.to_ids(k.as_str()?))
        .collect();
    found.sort();
    assert_eq!(found, vec![vec!["p", "1"], vec!["p", "2"]]);

    assert!(matches!(
        pairs.find_keys(["p", "1", "extra"]),
        Err(Error::Arity { .. })
    ));
}

#[tokio::test]
async fn test_list_operations() {
    let store = memory_store();
    let queue = ListCollection::new("queue:${id}", 1).unwrap();

    let resolved = store
        .resolve(Structure::seq([
            queue.push_right("q", ["a", "b", "c", "b", "d"]).unwrap(),
            queue.push_left("q", ["z"]).unwrap(),
            queue.get_length("q").unwrap(),
            queue.get("q", -1).unwrap(),
            queue.get_left("q", 1).unwrap(),
            queue.get_right("q", -2).unwrap(),
            queue.remove_all("q", "b").unwrap(),
            queue.pop_left("q").unwrap(),
            queue.pop_right("q").unwrap(),
            queue.get_all("q", 0, -1).unwrap(),
        ]))
        .await
        .unwrap();
    assert_eq!(
        resolved.to_string(),
        r#"[5,6,6,"d",["z","a"],["b","d"],2,"z","d",["a","c"]]"#
    );

    store.resolve(queue.clear("q").unwrap()).await.unwrap();
    let exists = store.resolve(queue.exists("q").unwrap()).await.unwrap();
    assert_eq!(exists, Value::Int(0));
}

#[tokio::test]
async fn test_value_ttl_is_accepted_but_ignored() {
    let store = memory_store();
    let counters = ValueCollection::new("counter:${id}", 1).unwrap();

    let resolved = store
        .resolve(Structure::seq([
            counters.inc("c").unwrap(),
            counters.inc("c").unwrap(),
            counters.set_ttl("c", 60).unwrap(),
            counters.get_ttl("c").unwrap(),
            counters.set_ttl("missing", 60).unwrap(),
            counters.get("c").unwrap(),
        ]))
        .await
        .unwrap();
    assert_eq!(resolved.to_string(), r#"[1,2,1,-1,0,"2"]"#);
}

#[tokio::test]
async fn test_backends_share_one_table() {
    let table: Arc<dyn RedisStore> = Arc::new(MemoryStore::new());
    let writer = Store::new(MemoryBackend::with_store(table.clone()));
    let reader = Store::new(MemoryBackend::with_store(table));
    let values = ValueCollection::new("v:${id}", 1).unwrap();

    writer.resolve(values.set("k", "hello").unwrap()).await.unwrap();
    let got = reader.resolve(values.get("k").unwrap()).await.unwrap();
    assert_eq!(got, Value::from("hello"));
}

#[tokio::test]
async fn test_arity_mismatch_at_call_time() {
    let pairs = MapCollection::new("pair:${a}:${b}", 2).unwrap();
    assert!(matches!(
        pairs.get_map("only-one"),
        Err(Error::Arity {
            expected: 2,
            given: 1
        })
    ));
    assert!(matches!(
        SetCollection::new("", 0),
        Err(Error::Configuration(_))
    ));
}
