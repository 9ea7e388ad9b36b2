use crate::config::UiConfig;

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<style>
  body { font-family: system-ui, sans-serif; background: #0E1117; color: #fafafa; margin: 0; padding: 2rem 1rem 5rem; }
  main { max-width: 720px; margin: 0 auto; }
  input[type=url] { width: 100%; box-sizing: border-box; padding: 0.6rem; border-radius: 4px; border: 1px solid #333; background: #262730; color: inherit; }
  .row { display: flex; gap: 1rem; align-items: center; margin: 1rem 0; flex-wrap: wrap; }
  button, a.save { min-width: 120px; background: {{ACCENT}}; color: white; border: none; padding: 8px 24px; border-radius: 4px; font-weight: bold; font-size: 1rem; cursor: pointer; text-decoration: none; display: inline-flex; justify-content: center; }
  button:hover, a.save:hover { background: {{ACCENT_HOVER}}; }
  button:disabled { opacity: 0.5; cursor: wait; }
  progress { width: 100%; height: 1rem; }
  .success-message { padding: 1rem; border-radius: 5px; background: {{SUCCESS_BG}}; margin: 0.5rem 0; }
  .error-message { padding: 1rem; border-radius: 5px; background: {{ERROR_BG}}; margin: 0.5rem 0; }
  .hidden { display: none; }
  pre { white-space: pre-wrap; margin: 0; }
  .footer { text-align: center; padding: 1rem; color: #666; position: fixed; bottom: 0; left: 0; width: 100%; background: #0E1117; border-top: 1px solid #333; }
</style>
</head>
<body>
<main>
  <h1>{{TITLE}}</h1>
  <p>{{DESCRIPTION}}</p>
  <form id="form">
    <label for="url">YouTube 链接（视频或播放列表）:</label>
    <input id="url" type="url" required placeholder="https://www.youtube.com/watch?v=...">
    <div class="row">
      <span>格式:</span>
      <label><input type="radio" name="format" value="mp4" checked> mp4</label>
      <label><input type="radio" name="format" value="mp3"> mp3</label>
      <button id="download" type="submit">⬇️ 下载</button>
    </div>
  </form>
  <div id="progress-box" class="hidden">
    <progress id="progress" max="100" value="0"></progress>
    <pre id="status"></pre>
  </div>
  <div id="message"></div>
  <div id="save-box" class="row hidden"><a id="save" class="save" href="#">💾 保存文件</a></div>
</main>
<div class="footer"><p>{{FOOTER}}</p></div>
<script>
const $ = (id) => document.getElementById(id);
const mb = (bytes) => (bytes / (1024 * 1024)).toFixed(1) + 'MB';

function showMessage(kind, text) {
  const box = $('message');
  box.innerHTML = '';
  const div = document.createElement('div');
  div.className = kind + '-message';
  div.textContent = text;
  box.appendChild(div);
}

function renderProgress(job) {
  const p = job.progress;
  if (!p) { $('status').textContent = '⏳ 准备中...'; return; }
  $('progress').value = p.percent_complete;
  let text = '⏳ 进度: ' + p.percent_complete.toFixed(1) + '%\n📥 已下载: ' + mb(p.bytes_downloaded) + ' / ' + mb(p.total_bytes);
  if (p.item_index && p.item_count) { text = '第 ' + p.item_index + ' / ' + p.item_count + ' 项\n' + text; }
  $('status').textContent = text;
}

async function poll(id) {
  const res = await fetch('/api/downloads/' + id);
  if (!res.ok) { showMessage('error', '❌ 任务不存在'); $('download').disabled = false; return; }
  const job = await res.json();
  renderProgress(job);
  if (job.state === 'completed') {
    $('download').disabled = false;
    showMessage('success', job.is_playlist ? '✅ 播放列表下载成功！' : '✅ 视频下载成功！');
    $('save').href = '/api/downloads/' + id + '/file';
    $('save').setAttribute('download', job.file_name || '');
    $('save-box').classList.remove('hidden');
  } else if (job.state === 'failed') {
    $('download').disabled = false;
    showMessage('error', '❌ ' + (job.error ? job.error.message : '下载失败'));
    fetch('/api/downloads/' + id, { method: 'DELETE' });
    current = null;
  } else {
    setTimeout(() => poll(id), 500);
  }
}

let current = null;

// 下载链接只能用一次，服务端在保存后移除任务
$('save').addEventListener('click', () => {
  current = null;
  setTimeout(() => $('save-box').classList.add('hidden'), 0);
});

$('form').addEventListener('submit', async (event) => {
  event.preventDefault();
  $('message').innerHTML = '';
  $('save-box').classList.add('hidden');
  if (current) {
    fetch('/api/downloads/' + current, { method: 'DELETE' });
    current = null;
  }
  const url = $('url').value.trim();
  if (!url) { showMessage('error', '请输入 YouTube 链接'); return; }
  const format = document.querySelector('input[name=format]:checked').value;
  $('download').disabled = true;
  const res = await fetch('/api/downloads', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ url, format }),
  });
  const body = await res.json().catch(() => ({}));
  if (!res.ok) {
    $('download').disabled = false;
    showMessage('error', '❌ ' + (body.error || '请求失败'));
    return;
  }
  $('progress').value = 0;
  $('progress-box').classList.remove('hidden');
  current = body.id;
  poll(body.id);
});
</script>
</body>
</html>
"##;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// 颜色值只允许 #xxxxxx 这类字符，其余回退为默认值
fn css_color<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | ' ' | '%'));
    if valid { value } else { fallback }
}

pub fn render_index(ui: &UiConfig) -> String {
    let defaults = UiConfig::default();
    INDEX_TEMPLATE
        .replace("{{TITLE}}", &escape_html(&ui.title))
        .replace("{{DESCRIPTION}}", &escape_html(&ui.description))
        .replace("{{FOOTER}}", &escape_html(&ui.footer))
        .replace("{{ACCENT_HOVER}}", css_color(&ui.accent_hover_color, &defaults.accent_hover_color))
        .replace("{{ACCENT}}", css_color(&ui.accent_color, &defaults.accent_color))
        .replace("{{SUCCESS_BG}}", css_color(&ui.success_background, &defaults.success_background))
        .replace("{{ERROR_BG}}", css_color(&ui.error_background, &defaults.error_background))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_theme_and_escapes_text() {
        let ui = UiConfig {
            title: "<b>Tube</b>".to_string(),
            accent_color: "#123456".to_string(),
            error_background: "red;}</style>".to_string(),
            ..UiConfig::default()
        };
        let html = render_index(&ui);
        assert!(html.contains("&lt;b&gt;Tube&lt;/b&gt;"));
        assert!(html.contains("background: #123456"));
        assert!(html.contains("background: #3d0c11"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn template_is_complete() {
        let html = render_index(&UiConfig::default());
        assert!(html.contains(r##"<a id="save" class="save" href="#">"##));
        assert!(html.contains("poll(body.id);"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
