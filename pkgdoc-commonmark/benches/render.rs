#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  reason = "Fine in benchmarks"
)]
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pkgdoc_commonmark::{
  ImageProxySigner,
  ReadmeRenderer,
  RenderOptions,
  RenderRequest,
  RepositoryInfo,
  RepositoryProvider,
};

const README_SMALL: &str = r"# tiny-pkg

A tiny package.

## Install

```sh
npm install tiny-pkg
```
";

const README_LARGE: &str = r#"<div align="center">
  <img src="./assets/logo.svg" alt="widgets" width="120">
  <h1>widgets</h1>
  <p>
    <a href="https://www.npmjs.com/package/widgets"><img src="https://img.shields.io/npm/v/widgets" alt="npm"></a>
    <a href="https://stackblitz.com/edit/widgets"><img src="https://developer.stackblitz.com/img/open_in_stackblitz.svg" alt="Open in StackBlitz"></a>
  </p>
</div>

> [!NOTE]
> Widgets requires Node 20 or newer.

## Features

- :zap: Fast
- :lock: Safe by default
- [x] Tree-shakeable
- [ ] Batteries

## Install

```sh
npm install widgets
```

## Usage

```ts
import { createWidget } from "widgets";

const widget = createWidget({ name: "demo" });
widget.render(document.body);
```

<h2>API</h2>

### createWidget(options)

| Option | Type | Default |
|--------|:----:|--------:|
| name   | string | `"widget"` |
| size   | number | `1` |

See [the guide](./docs/GUIDE.md) and [Usage](#usage).

![screenshot](https://example.com/screenshot.png)

## API

#License

MIT
"#;

fn bench_render(c: &mut Criterion) {
  let mut group = c.benchmark_group("render");

  let plain = ReadmeRenderer::new(RenderOptions {
    highlight_code: false,
    ..Default::default()
  });
  let highlighted = ReadmeRenderer::default().with_image_proxy(
    ImageProxySigner::new("bench-secret").expect("non-empty secret"),
  );
  let repo = RepositoryInfo::new(RepositoryProvider::GitHub, "octo", "widgets")
    .expect("github has base urls");

  for (name, content) in [("small", README_SMALL), ("large", README_LARGE)] {
    group.bench_with_input(BenchmarkId::new("plain", name), &content, |b, md| {
      b.iter(|| {
        plain.render(black_box(
          &RenderRequest::new(Some(*md), "widgets").repository(&repo),
        ))
      });
    });

    group.bench_with_input(
      BenchmarkId::new("highlighted", name),
      &content,
      |b, md| {
        b.iter(|| {
          highlighted.render(black_box(
            &RenderRequest::new(Some(*md), "widgets").repository(&repo),
          ))
        });
      },
    );
  }

  group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
