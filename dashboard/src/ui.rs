//! The single-page dashboard UI, embedded in the binary and served at `/`.
//! Four tabs, each polling its own endpoint every 30 seconds. A failed poll
//! keeps the last good payload on screen; only the connection dot changes.

use axum::response::Html;

pub async fn page() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Polymarket Agent Dashboard</title>
<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #0a0e17; color: #c9d1d9; font-family: 'Cascadia Code', 'Fira Code', 'JetBrains Mono', monospace; font-size: 13px; }

.header { background: #161b22; border-bottom: 1px solid #30363d; padding: 16px 24px; display: flex; justify-content: space-between; align-items: center; }
.header h1 { font-size: 18px; color: #58a6ff; font-weight: 600; }
.header .right { display: flex; align-items: center; gap: 12px; color: #8b949e; font-size: 12px; }
.conn-dot { width: 8px; height: 8px; border-radius: 50%; display: inline-block; }
.conn-dot.ok { background: #3fb950; }
.conn-dot.fail { background: #f85149; }
.alive-badge { font-size: 10px; font-weight: 700; border-radius: 4px; padding: 2px 8px; text-transform: uppercase; letter-spacing: 0.5px; }
.alive-badge.alive { background: rgba(63,185,80,0.15); color: #3fb950; border: 1px solid rgba(63,185,80,0.4); }
.alive-badge.dead { background: rgba(248,81,73,0.15); color: #f85149; border: 1px solid rgba(248,81,73,0.4); }

.tabs { background: #161b22; border-bottom: 1px solid #30363d; padding: 0 24px; display: flex; gap: 4px; }
.tab { padding: 10px 18px; cursor: pointer; color: #8b949e; border-bottom: 2px solid transparent; font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; }
.tab:hover { color: #c9d1d9; }
.tab.active { color: #58a6ff; border-bottom-color: #58a6ff; }

.view { display: none; padding: 16px 24px; }
.view.active { display: block; }

.loading { color: #8b949e; padding: 40px; text-align: center; }
.spinner { display: inline-block; width: 14px; height: 14px; border: 2px solid #30363d; border-top-color: #58a6ff; border-radius: 50%; animation: spin 0.8s linear infinite; vertical-align: middle; margin-right: 8px; }
@keyframes spin { to { transform: rotate(360deg); } }

.metrics { display: flex; gap: 12px; flex-wrap: wrap; margin-bottom: 16px; }
.metric-card { background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 14px 18px; flex: 1; min-width: 130px; }
.metric-card .label { font-size: 11px; color: #8b949e; text-transform: uppercase; letter-spacing: 0.5px; }
.metric-card .value { font-size: 22px; font-weight: 700; margin-top: 4px; }
.metric-card .value.positive { color: #3fb950; }
.metric-card .value.negative { color: #f85149; }
.metric-card .value.neutral { color: #58a6ff; }

.section-title { font-size: 12px; color: #8b949e; text-transform: uppercase; letter-spacing: 0.5px; margin: 16px 0 8px; font-weight: 600; }
.panel { background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 12px; }
.grid-2 { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
@media (max-width: 900px) { .grid-2 { grid-template-columns: 1fr; } }

table { width: 100%; border-collapse: collapse; font-size: 12px; }
th { text-align: left; color: #8b949e; font-weight: 600; padding: 6px 8px; border-bottom: 1px solid #30363d; text-transform: uppercase; font-size: 10px; letter-spacing: 0.5px; }
td { padding: 6px 8px; border-bottom: 1px solid #21262d; }
tr:last-child td { border-bottom: none; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.positive { color: #3fb950; }
.negative { color: #f85149; }
.muted { color: #8b949e; }
.question { max-width: 380px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }

.badge { font-size: 9px; font-weight: 700; border-radius: 3px; padding: 1px 6px; text-transform: uppercase; }
.badge.yes { background: rgba(63,185,80,0.15); color: #3fb950; }
.badge.no { background: rgba(248,81,73,0.15); color: #f85149; }
.badge.open { background: rgba(88,166,255,0.15); color: #58a6ff; }
.badge.closed { background: rgba(139,148,158,0.15); color: #8b949e; }
.badge.resolved { background: rgba(187,128,255,0.15); color: #bc8cff; }

.exposure-row { display: flex; align-items: center; gap: 10px; padding: 4px 0; }
.exposure-row .name { width: 160px; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.exposure-row .bar-track { flex: 1; height: 8px; background: #21262d; border-radius: 4px; overflow: hidden; }
.exposure-row .bar-fill { height: 100%; background: #58a6ff; border-radius: 4px; }
.exposure-row .amt { width: 90px; text-align: right; font-variant-numeric: tabular-nums; }

.position-card { background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 12px; margin-bottom: 10px; }
.pos-header { display: flex; justify-content: space-between; align-items: flex-start; gap: 12px; margin-bottom: 8px; }
.pos-question { font-weight: 600; }
.pos-stats { display: flex; gap: 18px; flex-wrap: wrap; font-size: 11px; color: #8b949e; margin-bottom: 8px; }
.pos-stats b { color: #c9d1d9; font-weight: 600; }
.sparkline { width: 100%; height: 60px; background: #0d1117; border-radius: 4px; }

.filters { display: flex; gap: 12px; align-items: flex-end; margin-bottom: 12px; flex-wrap: wrap; }
.filter-group { display: flex; flex-direction: column; gap: 3px; }
.filter-group label { font-size: 10px; color: #8b949e; text-transform: uppercase; letter-spacing: 0.5px; }
.filter-group select { background: #0d1117; color: #c9d1d9; border: 1px solid #30363d; border-radius: 4px; padding: 6px 10px; font-size: 12px; font-family: inherit; }
.pager { display: flex; gap: 8px; align-items: center; margin-top: 10px; color: #8b949e; font-size: 11px; }
.pager button { background: #21262d; color: #c9d1d9; border: 1px solid #30363d; border-radius: 4px; padding: 4px 12px; font-family: inherit; font-size: 11px; cursor: pointer; }
.pager button:disabled { opacity: 0.4; cursor: not-allowed; }

.chart { width: 100%; height: 220px; background: #0d1117; border-radius: 4px; }
.empty { color: #484f58; padding: 20px; text-align: center; }
</style>
</head>
<body>

<div class="header">
  <h1>POLYMARKET AGENT DASHBOARD</h1>
  <div class="right">
    <span id="alive-badge" class="alive-badge dead" style="display:none">agent down</span>
    <span id="last-updated"></span>
    <span id="conn-dot" class="conn-dot fail"></span>
  </div>
</div>

<div class="tabs">
  <div class="tab active" data-tab="overview">Overview</div>
  <div class="tab" data-tab="positions">Open Positions</div>
  <div class="tab" data-tab="history">Trade History</div>
  <div class="tab" data-tab="analytics">Analytics</div>
</div>

<div id="view-overview" class="view active">
  <div class="loading"><span class="spinner"></span>Loading overview...</div>
</div>
<div id="view-positions" class="view">
  <div class="loading"><span class="spinner"></span>Loading positions...</div>
</div>
<div id="view-history" class="view">
  <div class="loading"><span class="spinner"></span>Loading trades...</div>
</div>
<div id="view-analytics" class="view">
  <div class="loading"><span class="spinner"></span>Loading analytics...</div>
</div>

<script>
const POLL_MS = 30000;
let activeTab = 'overview';
let pollTimer = null;

// History tab state survives re-renders so filter/page selections stick.
const hist = { status: '', strategy: '', offset: 0, limit: 50 };

async function fetchJSON(url) {
    const res = await fetch(url);
    if (!res.ok) throw new Error(url + ' -> ' + res.status);
    return res.json();
}

function setConn(ok) {
    document.getElementById('conn-dot').className = 'conn-dot ' + (ok ? 'ok' : 'fail');
    if (ok) {
        document.getElementById('last-updated').textContent =
            'updated ' + new Date().toLocaleTimeString();
    }
}

function fmtUsd(v) {
    if (v === null || v === undefined) return '—';
    const sign = v < 0 ? '-' : '';
    return sign + '$' + Math.abs(v).toFixed(2);
}
function fmtPrice(v) { return v === null || v === undefined ? '—' : Number(v).toFixed(3); }
function pnlClass(v) { return v > 0 ? 'positive' : v < 0 ? 'negative' : 'muted'; }
function esc(s) {
    const d = document.createElement('div');
    d.textContent = s === null || s === undefined ? '' : String(s);
    return d.innerHTML;
}
function badge(kind) { return '<span class="badge ' + kind.toLowerCase() + '">' + kind + '</span>'; }

function tradeRows(trades) {
    if (!trades.length) return '<div class="empty">No trades yet</div>';
    let html = '<table><tr><th>Time</th><th>Question</th><th>Strategy</th><th>Side</th>' +
        '<th>Entry</th><th>Cost</th><th>Status</th><th>PnL</th></tr>';
    for (const t of trades) {
        const pnl = t.pnl === null ? '<td class="num muted">—</td>'
            : '<td class="num ' + pnlClass(t.pnl) + '">' + fmtUsd(t.pnl) + '</td>';
        html += '<tr>' +
            '<td class="muted">' + new Date(t.created_at).toLocaleString() + '</td>' +
            '<td class="question" title="' + esc(t.market_question) + '">' + esc(t.market_question) + '</td>' +
            '<td>' + esc(t.strategy) + '</td>' +
            '<td>' + badge(t.side) + '</td>' +
            '<td class="num">' + fmtPrice(t.entry_price) + '</td>' +
            '<td class="num">' + fmtUsd(t.cost_usd) + '</td>' +
            '<td>' + badge(t.status) + '</td>' +
            pnl + '</tr>';
    }
    return html + '</table>';
}

// ── Overview ──

async function loadOverview() {
    const data = await fetchJSON('/api/dashboard');
    const s = data.state;

    const alive = document.getElementById('alive-badge');
    if (s) {
        alive.style.display = '';
        alive.className = 'alive-badge ' + (s.is_alive ? 'alive' : 'dead');
        alive.textContent = s.is_alive ? 'agent alive' : 'agent down';
    }

    let html = '<div class="metrics">';
    html += metric('Bankroll', s ? fmtUsd(s.bankroll) : '—', 'neutral');
    html += metric('Total PnL', s ? fmtUsd(s.total_pnl) : '—', s ? pnlClass(s.total_pnl) : '');
    html += metric('Exposure', fmtUsd(data.exposure), 'neutral');
    html += metric('Open', data.openCount, '');
    html += metric('Closed', data.closedCount, '');
    html += metric('API Cost', s ? fmtUsd(s.total_api_cost) : '—', '');
    html += '</div>';

    html += '<div class="grid-2">';
    html += '<div><div class="section-title">Exposure by Strategy</div><div class="panel">' +
        exposureBars(data.exposureByStrategy, data.exposure) + '</div></div>';
    html += '<div><div class="section-title">Strategies</div><div class="panel">' +
        (data.strategies.length
            ? data.strategies.map(esc).join('<br>')
            : '<div class="empty">None yet</div>') + '</div></div>';
    html += '</div>';

    html += '<div class="section-title">Recent Trades</div><div class="panel">' +
        tradeRows(data.recentTrades) + '</div>';

    document.getElementById('view-overview').innerHTML = html;
}

function metric(label, value, cls) {
    return '<div class="metric-card"><div class="label">' + label +
        '</div><div class="value ' + cls + '">' + value + '</div></div>';
}

function exposureBars(rows, total) {
    if (!rows.length) return '<div class="empty">No open exposure</div>';
    let html = '';
    for (const r of rows) {
        const pct = total > 0 ? (r.exposure / total) * 100 : 0;
        html += '<div class="exposure-row">' +
            '<span class="name">' + esc(r.strategy) + '</span>' +
            '<span class="bar-track"><span class="bar-fill" style="width:' + pct + '%"></span></span>' +
            '<span class="amt">' + fmtUsd(r.exposure) + '</span></div>';
    }
    return html;
}

// ── Open positions ──

async function loadPositions() {
    const data = await fetchJSON('/api/positions');
    const view = document.getElementById('view-positions');

    if (!data.positions.length) {
        view.innerHTML = '<div class="empty">No open positions</div>';
        return;
    }

    let html = '';
    for (const p of data.positions) {
        html += '<div class="position-card">' +
            '<div class="pos-header"><span class="pos-question">' + esc(p.market_question) +
            '</span>' + badge(p.side) + '</div>' +
            '<div class="pos-stats">' +
            '<span>Strategy <b>' + esc(p.strategy) + '</b></span>' +
            '<span>Entry <b>' + fmtPrice(p.entry_price) + '</b></span>' +
            '<span>Current <b>' + fmtPrice(p.current_price) + '</b></span>' +
            '<span>Size <b>' + p.size + '</b></span>' +
            '<span>Cost <b>' + fmtUsd(p.cost_usd) + '</b></span>' +
            '<span>Unrealized <b class="' + pnlClass(p.unrealized_pnl) + '">' +
            fmtUsd(p.unrealized_pnl) + '</b></span>' +
            '</div>' +
            '<canvas class="sparkline" id="spark-' + p.id + '"></canvas>' +
            '</div>';
    }
    view.innerHTML = html;

    // One price-history sub-request per open position; bounded by the
    // position count. Each drives the per-position sparkline.
    for (const p of data.positions) {
        fetchJSON('/api/prices?marketId=' + encodeURIComponent(p.market_id) + '&limit=100')
            .then(d => drawSparkline('spark-' + p.id, d.prices, p.side))
            .catch(() => {});
    }
}

function drawSparkline(canvasId, prices, side) {
    const canvas = document.getElementById(canvasId);
    if (!canvas || !prices.length) return;
    const ctx = canvas.getContext('2d');
    const w = canvas.width = canvas.clientWidth;
    const h = canvas.height = canvas.clientHeight;

    // Newest-first from the API; chart wants chronological.
    const series = prices.map(p => side === 'YES' ? p.yes_price : p.no_price).reverse();
    const min = Math.min(...series), max = Math.max(...series);
    const span = max - min || 1;
    const x = i => series.length > 1 ? (i / (series.length - 1)) * (w - 8) + 4 : w / 2;
    const y = v => h - 6 - ((v - min) / span) * (h - 12);

    ctx.clearRect(0, 0, w, h);
    ctx.strokeStyle = series[series.length - 1] >= series[0] ? '#3fb950' : '#f85149';
    ctx.lineWidth = 1.5;
    ctx.beginPath();
    series.forEach((v, i) => i === 0 ? ctx.moveTo(x(i), y(v)) : ctx.lineTo(x(i), y(v)));
    ctx.stroke();
}

// ── Trade history ──

async function loadHistory() {
    const params = new URLSearchParams();
    if (hist.status) params.set('status', hist.status);
    if (hist.strategy) params.set('strategy', hist.strategy);
    params.set('limit', hist.limit);
    params.set('offset', hist.offset);

    const data = await fetchJSON('/api/trades?' + params);

    let html = '<div class="filters">' +
        filterSelect('status', 'Status', ['', 'open', 'closed', 'resolved'], hist.status) +
        filterSelect('strategy', 'Strategy', [''].concat(data.strategies), hist.strategy) +
        '</div>';
    html += '<div class="panel">' + tradeRows(data.trades) + '</div>';

    const page = Math.floor(hist.offset / hist.limit) + 1;
    const pages = Math.max(1, Math.ceil(data.total / hist.limit));
    html += '<div class="pager">' +
        '<button onclick="histPage(-1)"' + (hist.offset === 0 ? ' disabled' : '') + '>Prev</button>' +
        '<span>page ' + page + ' / ' + pages + ' (' + data.total + ' trades)</span>' +
        '<button onclick="histPage(1)"' + (hist.offset + hist.limit >= data.total ? ' disabled' : '') + '>Next</button>' +
        '</div>';

    document.getElementById('view-history').innerHTML = html;
}

function filterSelect(key, label, options, selected) {
    let html = '<div class="filter-group"><label>' + label + '</label>' +
        '<select onchange="histFilter(\'' + key + '\', this.value)">';
    for (const opt of options) {
        html += '<option value="' + esc(opt) + '"' + (opt === selected ? ' selected' : '') + '>' +
            (opt === '' ? 'all' : esc(opt)) + '</option>';
    }
    return html + '</select></div>';
}

// Filter changes re-fetch immediately, outside the poll cycle.
function histFilter(key, value) {
    hist[key] = value;
    hist.offset = 0;
    loadHistory().then(() => setConn(true)).catch(() => setConn(false));
}

function histPage(dir) {
    hist.offset = Math.max(0, hist.offset + dir * hist.limit);
    loadHistory().then(() => setConn(true)).catch(() => setConn(false));
}

// ── Analytics ──

async function loadAnalytics() {
    const data = await fetchJSON('/api/analytics');

    let html = '<div class="metrics">';
    html += metric('Total Trades', data.totalTrades, '');
    html += metric('Closed', data.closedTrades, '');
    html += metric('Total PnL', data.state ? fmtUsd(data.state.total_pnl) : '—',
        data.state ? pnlClass(data.state.total_pnl) : '');
    html += '</div>';

    html += '<div class="section-title">Cumulative PnL</div><div class="panel">' +
        (data.pnlOverTime.length
            ? '<canvas id="pnl-chart" class="chart"></canvas>'
            : '<div class="empty">No closed trades yet</div>') + '</div>';

    html += '<div class="section-title">Win Rate by Strategy</div><div class="panel">' +
        winRateTable(data.winRateByStrategy) + '</div>';

    html += '<div class="grid-2">';
    html += '<div><div class="section-title">Best Trades</div><div class="panel">' +
        rankedRows(data.bestTrades) + '</div></div>';
    html += '<div><div class="section-title">Worst Trades</div><div class="panel">' +
        rankedRows(data.worstTrades) + '</div></div>';
    html += '</div>';

    document.getElementById('view-analytics').innerHTML = html;
    if (data.pnlOverTime.length) drawPnlChart(data.pnlOverTime);
}

function winRateTable(rows) {
    if (!rows.length) return '<div class="empty">No closed trades yet</div>';
    let html = '<table><tr><th>Strategy</th><th>Wins</th><th>Losses</th><th>Total</th><th>Win Rate</th></tr>';
    for (const r of rows) {
        html += '<tr><td>' + esc(r.strategy) + '</td>' +
            '<td class="num positive">' + r.wins + '</td>' +
            '<td class="num negative">' + r.losses + '</td>' +
            '<td class="num">' + r.total + '</td>' +
            '<td class="num">' + r.win_rate.toFixed(1) + '%</td></tr>';
    }
    return html + '</table>';
}

function rankedRows(trades) {
    if (!trades.length) return '<div class="empty">Nothing yet</div>';
    let html = '<table><tr><th>Question</th><th>Strategy</th><th>PnL</th></tr>';
    for (const t of trades) {
        html += '<tr><td class="question" title="' + esc(t.market_question) + '">' +
            esc(t.market_question) + '</td>' +
            '<td>' + esc(t.strategy) + '</td>' +
            '<td class="num ' + pnlClass(t.pnl) + '">' + fmtUsd(t.pnl) + '</td></tr>';
    }
    return html + '</table>';
}

function drawPnlChart(points) {
    const canvas = document.getElementById('pnl-chart');
    if (!canvas) return;
    const ctx = canvas.getContext('2d');
    const w = canvas.width = canvas.clientWidth;
    const h = canvas.height = canvas.clientHeight;

    const series = points.map(p => p.cumulative_pnl);
    const min = Math.min(0, ...series), max = Math.max(0, ...series);
    const span = max - min || 1;
    const x = i => series.length > 1 ? (i / (series.length - 1)) * (w - 60) + 40 : w / 2;
    const y = v => h - 24 - ((v - min) / span) * (h - 40);

    ctx.clearRect(0, 0, w, h);

    // Zero line
    ctx.strokeStyle = '#30363d';
    ctx.setLineDash([3, 3]);
    ctx.beginPath();
    ctx.moveTo(40, y(0));
    ctx.lineTo(w - 20, y(0));
    ctx.stroke();
    ctx.setLineDash([]);

    ctx.strokeStyle = series[series.length - 1] >= 0 ? '#3fb950' : '#f85149';
    ctx.lineWidth = 2;
    ctx.beginPath();
    series.forEach((v, i) => i === 0 ? ctx.moveTo(x(i), y(v)) : ctx.lineTo(x(i), y(v)));
    ctx.stroke();

    ctx.fillStyle = '#8b949e';
    ctx.font = '10px monospace';
    ctx.fillText(fmtUsd(max), 2, y(max) + 4);
    ctx.fillText(fmtUsd(min), 2, y(min) + 4);
    ctx.fillText(points[0].date, 40, h - 8);
    const lastLabel = points[points.length - 1].date;
    ctx.fillText(lastLabel, w - 20 - ctx.measureText(lastLabel).width, h - 8);
}

// ── Tab switching & polling ──

const loaders = {
    overview: loadOverview,
    positions: loadPositions,
    history: loadHistory,
    analytics: loadAnalytics,
};

function poll() {
    loaders[activeTab]().then(() => setConn(true)).catch(err => {
        // Keep the last good render; just flag the connection.
        console.error('poll failed:', err);
        setConn(false);
    });
}

function showTab(name) {
    activeTab = name;
    document.querySelectorAll('.tab').forEach(el =>
        el.classList.toggle('active', el.dataset.tab === name));
    document.querySelectorAll('.view').forEach(el =>
        el.classList.toggle('active', el.id === 'view-' + name));

    // The previous tab's timer dies with the tab.
    if (pollTimer) clearInterval(pollTimer);
    poll();
    pollTimer = setInterval(poll, POLL_MS);
}

document.querySelectorAll('.tab').forEach(el =>
    el.addEventListener('click', () => showTab(el.dataset.tab)));

showTab('overview');
</script>
</body>
</html>
"##;
