//! Concurrent Thread Safety Tests for DI System
//!
//! - конкурентное первое разрешение singleton'а строит значение один раз
//! - параллельные регистрация и разрешение не дают порванных записей
//! - рекурсивное разрешение не блокируется на store
//! - `Injected` разделяется между потоками
//! - вызовы `provide` одного ключа не пересекаются

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use di::{Container, Injected, Provider, Resolver};

#[derive(Debug)]
struct SlowService {
    id: usize,
}

#[derive(Debug)]
struct Wrapper {
    inner: Arc<SlowService>,
}

/// Test concurrent first resolution of a cached factory from multiple threads
#[test]
fn test_concurrent_singleton_constructed_once() {
    common::init_test_logging();
    let container = Container::new();
    let constructions = Arc::new(AtomicUsize::new(0));

    container.register_singleton({
        let constructions = constructions.clone();
        move |_| {
            let id = constructions.fetch_add(1, Ordering::SeqCst);
            // Расширяем окно гонки
            thread::sleep(Duration::from_millis(20));
            SlowService { id }
        }
    });

    let thread_count = 16;
    // Создаем барьер для синхронизации запуска потоков
    let start_barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let container = container.clone();
            let barrier = start_barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.resolve::<SlowService>()
            })
        })
        .collect();

    let results: Vec<Arc<SlowService>> = handles
        .into_iter()
        .map(|h| h.join().expect("resolver thread panicked"))
        .collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    assert_eq!(results[0].id, 0);
}

#[test]
fn test_concurrent_register_and_resolve() {
    let container = Container::new();
    container.register_instance(0_usize);

    let thread_count = 8;
    let iterations = 500;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|thread_id| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for i in 0..iterations {
                    if thread_id % 2 == 0 {
                        container.register_instance(thread_id * iterations + i);
                        container.register_instance_named(format!("t{}", thread_id), i);
                    } else {
                        // Всегда видим либо старое, либо новое значение целиком
                        let value = container.resolve::<usize>();
                        assert!(*value < thread_count * iterations);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    // Безымянный слот + по одному именованному на пишущий поток
    assert_eq!(container.service_count(), 1 + thread_count / 2);
}

#[test]
fn test_recursive_resolution_across_threads() {
    let container = Container::new();
    let constructions = Arc::new(AtomicUsize::new(0));

    container.register_singleton({
        let constructions = constructions.clone();
        move |_| SlowService {
            id: constructions.fetch_add(1, Ordering::SeqCst),
        }
    });
    container.register_transient(|r| Wrapper {
        inner: r.resolve::<SlowService>(),
    });

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let container = container.clone();
            thread::spawn(move || {
                // Параллельно с разрешением идут новые регистрации
                container.register_instance_named(format!("noise-{}", i), i);
                container.resolve::<Wrapper>()
            })
        })
        .collect();

    let wrappers: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("resolver thread panicked"))
        .collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(wrappers
        .iter()
        .all(|w| Arc::ptr_eq(&w.inner, &wrappers[0].inner)));
}

#[test]
fn test_injected_shared_between_threads() {
    let container = Container::new();
    let resolutions = Arc::new(AtomicUsize::new(0));
    container.register_transient({
        let resolutions = resolutions.clone();
        move |_| SlowService {
            id: resolutions.fetch_add(1, Ordering::SeqCst),
        }
    });

    let injected = Arc::new(Injected::<SlowService>::in_container(&container));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injected = injected.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                injected.get().clone()
            })
        })
        .collect();

    let values: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("reader thread panicked"))
        .collect();

    // OnceCell: одно разрешение, один и тот же экземпляр у всех читателей
    assert_eq!(resolutions.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}

/// Provider без состояния значения, который считает одновременные вызовы
struct OverlapCounter {
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl Provider for OverlapCounter {
    type Value = SlowService;

    fn provide(&mut self, _resolver: &dyn Resolver) -> Arc<SlowService> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Arc::new(SlowService { id: now })
    }
}

#[test]
fn test_provide_calls_for_one_key_never_overlap() {
    let container = Container::new();
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    container.register_provider(OverlapCounter {
        active: active.clone(),
        max_active: max_active.clone(),
    });

    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));

    let handles: Vec<_> = (0..thread_count)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..5 {
                    assert_eq!(container.resolve::<SlowService>().id, 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("resolver thread panicked");
    }

    assert_eq!(max_active.load(Ordering::SeqCst), 1);
    assert_eq!(active.load(Ordering::SeqCst), 0);
}
